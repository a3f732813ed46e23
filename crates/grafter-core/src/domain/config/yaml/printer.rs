use super::{Annotation, Mapping, Scalar, Sequence, YamlNode};

pub(super) struct Printer {
    unit: usize,
    indentless: bool,
    out: String,
}

impl Printer {
    pub(super) fn new(unit: usize, indentless: bool) -> Self {
        Self {
            unit,
            indentless,
            out: String::new(),
        }
    }

    pub(super) fn finish(self) -> String {
        self.out
    }

    pub(super) fn verbatim(&mut self, line: &str) {
        self.out.push_str(line);
        self.out.push('\n');
    }

    pub(super) fn annotations(&mut self, lines: &[Annotation], col: usize) {
        for line in lines {
            match line {
                Annotation::Blank => self.out.push('\n'),
                Annotation::Verbatim(raw) => self.verbatim(raw),
                Annotation::Comment(text) => {
                    self.pad(col);
                    self.out.push_str("# ");
                    self.verbatim(text);
                }
            }
        }
    }

    pub(super) fn root(&mut self, node: &YamlNode) {
        match node {
            YamlNode::Mapping(map) => self.mapping(map, map.indent.unwrap_or(0), false),
            YamlNode::Sequence(seq) => self.sequence(seq, seq.indent.unwrap_or(0), false),
            YamlNode::Scalar(scalar) if !scalar.raw.is_empty() => self.verbatim(&scalar.raw),
            YamlNode::Scalar(_) => {}
        }
    }

    fn pad(&mut self, width: usize) {
        self.out.extend(std::iter::repeat_n(' ', width));
    }

    fn mapping(&mut self, map: &Mapping, col: usize, inline: bool) {
        for (i, entry) in map.entries.iter().enumerate() {
            if !(inline && i == 0) {
                self.annotations(&entry.leading, col);
                self.pad(col);
            }
            self.out.push_str(&entry.key);
            self.out.push(':');
            let trailing = entry.trailing.as_deref();
            match &entry.value {
                YamlNode::Scalar(scalar) => self.scalar(scalar, entry.between.as_deref(), trailing),
                YamlNode::Mapping(child) if child.entries.is_empty() => self.empty("{}", trailing),
                YamlNode::Sequence(child) if child.items.is_empty() => self.empty("[]", trailing),
                YamlNode::Mapping(child) => {
                    self.end_line(trailing);
                    self.mapping(child, child.indent.unwrap_or(col + self.unit), false);
                }
                YamlNode::Sequence(child) => {
                    self.end_line(trailing);
                    let offset = if self.indentless { 0 } else { self.unit };
                    self.sequence(child, child.indent.unwrap_or(col + offset), false);
                }
            }
        }
    }

    fn sequence(&mut self, seq: &Sequence, col: usize, inline: bool) {
        for (i, item) in seq.items.iter().enumerate() {
            if !(inline && i == 0) {
                self.annotations(&item.leading, col);
                self.pad(col);
            }
            self.out.push('-');
            let trailing = item.trailing.as_deref();
            match &item.value {
                YamlNode::Scalar(scalar) => self.scalar(scalar, item.between.as_deref(), trailing),
                YamlNode::Mapping(child) if child.entries.is_empty() => self.empty("{}", trailing),
                YamlNode::Sequence(child) if child.items.is_empty() => self.empty("[]", trailing),
                YamlNode::Mapping(child) => {
                    let inner = child.indent.unwrap_or(col + 2);
                    let first_bare = child.entries.first().is_some_and(|e| e.leading.is_empty());
                    if !item.block && first_bare && inner > col {
                        self.pad(inner - col - 1);
                        self.mapping(child, inner, true);
                    } else {
                        self.end_line(trailing);
                        self.mapping(child, inner, false);
                    }
                }
                YamlNode::Sequence(child) => {
                    let inner = child.indent.unwrap_or(col + 2);
                    let first_bare = child.items.first().is_some_and(|i| i.leading.is_empty());
                    if !item.block && first_bare && inner > col {
                        self.pad(inner - col - 1);
                        self.sequence(child, inner, true);
                    } else {
                        self.end_line(trailing);
                        self.sequence(child, inner, false);
                    }
                }
            }
        }
    }

    fn scalar(&mut self, scalar: &Scalar, between: Option<&str>, trailing: Option<&str>) {
        let trailing = trailing.unwrap_or("");
        if scalar.raw.starts_with('\n') {
            self.out.push_str(trailing);
            self.out.push_str(&scalar.raw);
        } else {
            if !scalar.raw.is_empty() {
                self.out.push_str(between.unwrap_or(" "));
                self.out.push_str(&scalar.raw);
            }
            self.out.push_str(trailing);
        }
        self.out.push('\n');
    }

    fn empty(&mut self, marker: &str, trailing: Option<&str>) {
        self.out.push(' ');
        self.out.push_str(marker);
        self.end_line(trailing);
    }

    fn end_line(&mut self, trailing: Option<&str>) {
        self.out.push_str(trailing.unwrap_or(""));
        self.out.push('\n');
    }
}
