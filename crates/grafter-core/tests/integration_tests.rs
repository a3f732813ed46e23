//! Integration tests for grafter-core: whole edits through the public API.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use grafter_core::domain::css::add_at_rule;
use grafter_core::domain::script::composite::{HandlerChain, PluginList, add_plugin, splice_handler};
use grafter_core::domain::script::ops::{
    PropValue, append, default_export, imports::add_default, imports::add_named,
    override_properties,
};
use grafter_core::domain::script::{Expr, parse_expression};
use grafter_core::prelude::*;

/// Project files shared between the provider and sink sides.
#[derive(Clone, Default)]
struct Store(Arc<Mutex<BTreeMap<String, String>>>);

impl Store {
    fn with(files: &[(&str, &str)]) -> Self {
        let store = Self::default();
        for (path, content) in files {
            store.0.lock().unwrap().insert(path.to_string(), content.to_string());
        }
        store
    }

    fn get(&self, path: &str) -> Option<String> {
        self.0.lock().unwrap().get(path).cloned()
    }

    fn service(&self, policy: FailurePolicy) -> EditService {
        EditService::new(Box::new(self.clone()), Box::new(self.clone())).with_policy(policy)
    }
}

impl ContentProvider for Store {
    fn read(&self, path: &RelativePath) -> GrafterResult<String> {
        Ok(self.get(&path.to_string()).unwrap_or_default())
    }

    fn exists(&self, path: &RelativePath) -> bool {
        self.get(&path.to_string()).is_some()
    }
}

impl ContentSink for Store {
    fn write(&self, path: &RelativePath, content: &str) -> GrafterResult<()> {
        self.0.lock().unwrap().insert(path.to_string(), content.to_string());
        Ok(())
    }
}

fn expr(code: &str) -> Expr {
    parse_expression(code).unwrap()
}

#[test]
fn named_imports_collapse_into_one_statement() {
    let once = edit_script("", |tree| {
        add_named(&mut tree.program, "pkg", ["foo", "bar"], false);
        Ok(())
    })
    .unwrap();
    assert_eq!(once, "import { foo, bar } from 'pkg';\n");

    let again = edit_script(&once, |tree| {
        add_named(&mut tree.program, "pkg", ["foo"], false);
        Ok(())
    })
    .unwrap();
    assert_eq!(again, once);
}

#[test]
fn nested_override_replaces_the_leaf() {
    let out = edit_script("export default { kit: { adapter: x() } };\n", |tree| {
        let config = default_export(&mut tree.program, Expr::object(Vec::new()))?;
        override_properties(
            config,
            [("kit", PropValue::object([("adapter", PropValue::Node(expr("y()")))]))],
        )
    })
    .unwrap();
    assert_eq!(out, "export default { kit: { adapter: y() } };\n");
}

#[test]
fn array_upsert_skips_equal_elements() {
    let src = "export default ['a'];\n";
    let same = edit_script(src, |tree| {
        let list = default_export(&mut tree.program, Expr::array(Vec::new()))?;
        assert!(!append(list, "a")?);
        Ok(())
    })
    .unwrap();
    assert_eq!(same, src);

    let grown = edit_script(src, |tree| {
        let list = default_export(&mut tree.program, Expr::array(Vec::new()))?;
        append(list, "b").map(|_| ())
    })
    .unwrap();
    assert_eq!(grown, "export default ['a', 'b'];\n");
}

#[test]
fn handlers_from_two_addons_share_one_sequence() {
    let store = Store::with(&[(
        "src/hooks.server.ts",
        "export const handle = async ({ event, resolve }) => {\n\treturn resolve(event);\n};\n",
    )]);

    let mut plan = EditPlan::new();
    for (addon, name) in [("paraglide", "newHandler"), ("auth", "secondHandler")] {
        plan.register_file_edit(addon, "src/hooks.server.ts", move |content| {
            edit_script(content, |tree| {
                let chain = HandlerChain::new(name, expr("(input) => input.resolve(input.event)"));
                splice_handler(&mut tree.program, &chain).map(|_| ())
            })
        })
        .unwrap();
    }

    let report = store.service(FailurePolicy::Abort).apply(&plan).unwrap();
    assert_eq!(report.files[0].status, FileStatus::Modified);
    assert_eq!(report.files[0].addons, ["paraglide", "auth"]);

    let hooks = store.get("src/hooks.server.ts").unwrap();
    assert!(hooks.contains("export const handle = sequence(originalHandle, newHandler, secondHandler);"));
    assert_eq!(hooks.matches("originalHandle =").count(), 1);

    let rerun = store.service(FailurePolicy::Abort).apply(&plan).unwrap();
    assert_eq!(rerun.files[0].status, FileStatus::Unchanged);
    assert_eq!(store.get("src/hooks.server.ts").unwrap(), hooks);
}

#[test]
fn inserted_code_follows_tab_indentation() {
    let out = edit_script("export default {\n\tkit: {}\n};\n", |tree| {
        add_plugin(&mut tree.program, expr("tailwindcss()"), &PluginList::default()).map(|_| ())
    })
    .unwrap();
    assert!(out.contains("\n\tplugins: [tailwindcss()]"));
    assert!(out.lines().all(|line| !line.starts_with(' ')));
}

#[test]
fn new_strings_follow_the_file_quote_style() {
    let out = edit_script("import a from \"a\";\nconst b = \"b\";\n", |tree| {
        add_default(&mut tree.program, "c", "c");
        Ok(())
    })
    .unwrap();
    assert!(out.contains("import c from \"c\";"));
    assert!(!out.contains('\''));
}

#[test]
fn comments_on_untouched_properties_survive() {
    let src = "export default {\n\t// the adapter\n\tadapter: x(),\n\tstrict: false\n};\n";
    let out = edit_script(src, |tree| {
        let config = default_export(&mut tree.program, Expr::object(Vec::new()))?;
        override_properties(config, [("strict", PropValue::Bool(true))])
    })
    .unwrap();
    assert!(out.contains("// the adapter"));
    assert!(out.contains("strict: true"));
    assert!(!out.contains("strict: false"));
}

#[test]
fn prepended_imports_land_in_reverse_call_order() {
    let out = edit_css("body {\n\tmargin: 0;\n}\n", |sheet| {
        add_at_rule(sheet, "import", "'b.css'", false)?;
        add_at_rule(sheet, "import", "'a.css'", false)?;
        Ok(())
    })
    .unwrap();
    assert_eq!(out, "@import 'a.css';\n@import 'b.css';\n\nbody {\n\tmargin: 0;\n}\n");
}

#[test]
fn untouched_files_round_trip() {
    let script = "import a from 'a';\n\n// keep\nexport default {\n  plugins: [a()],\n};\n";
    assert_eq!(ScriptTree::parse(script).unwrap().generate_code(), script);

    let css = "@import 'x.css';\n\n/* note */\na {\n  color: red;\n}\n";
    assert_eq!(Stylesheet::parse(css).unwrap().generate_code(), css);

    let component = "{#if user}\n\t<p>Hi {user.name}</p>\n{:else}\n\t<a href=\"/login\">Log in</a>\n{/if}\n";
    assert_eq!(Component::parse(component).unwrap().generate_code(), component);

    let json = "{\n    \"name\": \"app\",\n    \"private\": true\n}\n";
    assert_eq!(edit_json(json, |_| Ok(())).unwrap(), json);
}

#[test]
fn skip_addon_keeps_other_addons_running() {
    let store = Store::with(&[("broken.json", "{ \"a\": "), ("package.json", "{}\n")]);

    let mut plan = EditPlan::new();
    plan.register_file_edit("bad", "broken.json", |content| {
        edit_json(content, |doc| doc.set_path(&["b"], serde_json::json!(1)).map(|_| ()))
    })
    .unwrap();
    plan.register_file_edit("good", "package.json", |content| {
        edit_json(content, |doc| doc.set_path(&["type"], serde_json::json!("module")).map(|_| ()))
    })
    .unwrap();

    let report = store.service(FailurePolicy::SkipAddon).apply(&plan).unwrap();
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].addon(), Some("bad"));
    assert!(store.get("package.json").unwrap().contains("\"type\": \"module\""));
    assert_eq!(store.get("broken.json").unwrap(), "{ \"a\": ");
}

#[test]
fn abort_keeps_earlier_writes() {
    let store = Store::with(&[("package.json", "{}\n"), ("broken.json", "{")]);

    let mut plan = EditPlan::new();
    plan.register_file_edit("first", "package.json", |content| {
        edit_json(content, |doc| doc.set_path(&["private"], serde_json::json!(true)).map(|_| ()))
    })
    .unwrap();
    plan.register_file_edit("second", "broken.json", |content| {
        edit_json(content, |_| Ok(()))
    })
    .unwrap();

    let err = store.service(FailurePolicy::Abort).apply(&plan).unwrap_err();
    assert!(err.to_string().contains("second"));
    assert!(store.get("package.json").unwrap().contains("\"private\": true"));
}

#[test]
fn signals_travel_between_files_of_one_addon() {
    let store = Store::with(&[("package.json", "{\n  \"devDependencies\": { \"eslint\": \"^8.0.0\" }\n}\n")]);

    let mut plan = EditPlan::new();
    plan.register_file_edit_with("eslint", "package.json", |content, signals| {
        if content.contains("\"^8") {
            signals.insert("previous-major".into(), "8".into());
        }
        Ok(content.to_string())
    })
    .unwrap();
    plan.register_file_edit_with("eslint", "eslint.config.js", |content, signals| {
        let note = match signals.get("previous-major") {
            Some(major) => format!("// migrated from eslint {major}\n"),
            None => String::new(),
        };
        Ok(format!("{note}{content}export default [];\n"))
    })
    .unwrap();

    let report = store.service(FailurePolicy::Abort).apply(&plan).unwrap();
    assert_eq!(report.signals["eslint"]["previous-major"], "8");
    assert_eq!(
        store.get("eslint.config.js").unwrap(),
        "// migrated from eslint 8\nexport default [];\n"
    );
    assert_eq!(report.file("eslint.config.js").unwrap().status, FileStatus::Created);
}
