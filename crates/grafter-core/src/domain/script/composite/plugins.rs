//! Wrapped plugin-list upsert.
//!
//! Config files export their options either bare (`export default {...}`),
//! through a variable, or through a wrapper call such as
//! `defineConfig({...})` or `defineConfig(() => ({...}))`. All of these reach
//! the same options object.

use tracing::debug;

use crate::domain::error::DomainResult;
use crate::domain::script::ast::*;
use crate::domain::script::ops::{
    append, arrow_return_object, create_call, default_export, get_argument, prepend, property,
};

/// Where plugins live in a config file.
#[derive(Debug, Clone)]
pub struct PluginList {
    /// Array property holding the plugins.
    pub property: String,
    /// Wrapper calls whose first argument is the options object.
    pub wrappers: Vec<String>,
    /// Add at the end of the list instead of the start.
    pub append: bool,
}

impl Default for PluginList {
    fn default() -> Self {
        Self {
            property: "plugins".into(),
            wrappers: vec!["defineConfig".into()],
            append: true,
        }
    }
}

/// The options object behind a config file's default export.
pub fn config_object<'a>(program: &'a mut Program, wrappers: &[String]) -> DomainResult<&'a mut Expr> {
    let fallback = match wrappers.first() {
        Some(wrapper) => create_call(wrapper, vec![Expr::object(Vec::new())]),
        None => Expr::object(Vec::new()),
    };
    let export = default_export(program, fallback)?;

    let wrapped = export
        .callee_name()
        .is_some_and(|name| wrappers.iter().any(|w| w == name));
    if !wrapped {
        return Ok(export);
    }

    let arg = get_argument(export, 0, Expr::object(Vec::new()))?;
    if matches!(arg.peel().kind, ExprKind::Arrow { .. }) {
        debug!("config wrapper takes a function, using its returned object");
        return arrow_return_object(arg);
    }
    Ok(arg)
}

/// Add `plugin` to the config's plugin array unless an equal entry exists.
pub fn add_plugin(program: &mut Program, plugin: Expr, list: &PluginList) -> DomainResult<bool> {
    let config = config_object(program, &list.wrappers)?;
    let plugins = property(config, &list.property, Expr::array(Vec::new()))?;
    if list.append {
        append(plugins, plugin)
    } else {
        prepend(plugins, plugin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::DomainError;
    use crate::domain::script::{ScriptTree, parse_expression};

    fn run(src: &str, plugin: &str) -> String {
        let mut t = ScriptTree::parse(src).unwrap();
        add_plugin(
            &mut t.program,
            parse_expression(plugin).unwrap(),
            &PluginList::default(),
        )
        .unwrap();
        t.generate_code()
    }

    #[test]
    fn plugin_is_added_inside_wrapper() {
        let src = "import { defineConfig } from 'vite';\n\nexport default defineConfig({\n\tplugins: [sveltekit()]\n});\n";
        let out = run(src, "tailwindcss()");
        assert_eq!(
            out,
            "import { defineConfig } from 'vite';\n\nexport default defineConfig({\n\tplugins: [sveltekit(), tailwindcss()]\n});\n"
        );
        assert_eq!(run(&out, "tailwindcss()"), out);
    }

    #[test]
    fn arrow_wrapper_without_return_gets_one() {
        let src = "export default defineConfig(() => {\n\tconst env = 1;\n});\n";
        assert_eq!(
            run(src, "devtools()"),
            "export default defineConfig(() => {\n\tconst env = 1;\n\treturn {\n\t\tplugins: [devtools()]\n\t};\n});\n"
        );
    }

    #[test]
    fn bare_object_export_is_the_config() {
        let src = "const config = {};\n\nexport default config;\n";
        assert_eq!(
            run(src, "a()"),
            "const config = {\n\tplugins: [a()]\n};\n\nexport default config;\n"
        );
    }

    #[test]
    fn missing_export_is_created_with_wrapper() {
        assert_eq!(
            run("", "a()"),
            "export default defineConfig({\n\tplugins: [a()]\n});\n"
        );
    }

    #[test]
    fn non_object_config_is_a_shape_error() {
        let mut t = ScriptTree::parse("export default load();\n").unwrap();
        let err = add_plugin(&mut t.program, Expr::ident("a"), &PluginList::default()).unwrap_err();
        assert!(matches!(err, DomainError::UnexpectedShape { .. }));
    }
}
