//! Doc-comment helpers.

use crate::domain::comments::{Comment, CommentTable, Placement};
use crate::domain::node::NodeId;

/// Attach `/** @type {ty} */` in front of `node`. Returns `false` when the
/// node already carries it.
pub fn add_jsdoc_type(table: &mut CommentTable, node: NodeId, ty: &str) -> bool {
    table.add(node, Comment::block(format!("* @type {{{ty}}} ")), Placement::Leading)
}

/// Drop grammar comments containing `needle`.
pub fn remove_containing(table: &mut CommentTable, needle: &str) -> usize {
    table.remove(|comment| comment.text.contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::script::ops::default_export;
    use crate::domain::script::{Expr, ScriptTree};

    #[test]
    fn jsdoc_type_is_printed_once() {
        let mut t = ScriptTree::parse("").unwrap();
        let id = default_export(&mut t.program, Expr::object(Vec::new())).unwrap().meta.id;
        let stmt = t.program.body[0].meta.id;
        assert_ne!(id, stmt);
        assert!(add_jsdoc_type(&mut t.comments, stmt, "import('@sveltejs/kit').Config"));
        assert!(!add_jsdoc_type(&mut t.comments, stmt, "import('@sveltejs/kit').Config"));
        assert_eq!(
            t.generate_code(),
            "/** @type {import('@sveltejs/kit').Config} */\nexport default {};\n"
        );
    }

    #[test]
    fn stale_comments_are_removed() {
        let src = "// adapter-auto only supports some environments\nexport default {};\n";
        let mut t = ScriptTree::parse(src).unwrap();
        assert_eq!(remove_containing(&mut t.comments, "adapter-auto"), 1);
        t.program.body.push(crate::domain::script::parse_statement("run();").unwrap());
        assert_eq!(t.generate_code(), "export default {};\nrun();\n");
    }
}
