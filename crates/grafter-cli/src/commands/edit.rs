//! Single-edit commands: `import`, `plugin` and `set`.
//!
//! Each builds one recipe step and runs it through the same plan machinery
//! as `grafter apply`, registered under the command's name.

use tracing::instrument;

use grafter_adapters::recipe::{ImportSpec, KeyPath, Step};
use grafter_core::{
    application::{EditPlan, FailurePolicy, FileKind},
    error::GrafterError,
};

use crate::{
    cli::{EditArgs, ImportArgs, PluginArgs, SetArgs},
    config::{AppConfig, literal},
    commands::run_plan,
    error::{CliError, CliResult},
    output::OutputManager,
};

#[instrument(skip_all, fields(file = %args.file, from = %args.from))]
pub fn import(args: ImportArgs, config: &AppConfig, output: &OutputManager) -> CliResult<()> {
    require_script("import", &args.file)?;
    let step = Step::Import {
        path: args.file,
        import: ImportSpec {
            from: args.from,
            default: args.default,
            namespace: args.namespace,
            named: args.named,
            type_only: args.type_only,
        },
    };
    run_step("import", step, &args.edit, config, output)
}

#[instrument(skip_all, fields(file = %args.file, expr = %args.expr))]
pub fn plugin(args: PluginArgs, config: &AppConfig, output: &OutputManager) -> CliResult<()> {
    require_script("plugin", &args.file)?;
    let import = args.import_from.map(|from| ImportSpec {
        from,
        default: args.import_default,
        named: args.import_named,
        ..ImportSpec::default()
    });
    let step = Step::Plugin {
        path: args.file,
        expr: args.expr,
        import,
        property: args.property,
        prepend: args.prepend,
    };
    run_step("plugin", step, &args.edit, config, output)
}

#[instrument(skip_all, fields(file = %args.file, key = %args.key))]
pub fn set(args: SetArgs, config: &AppConfig, output: &OutputManager) -> CliResult<()> {
    let step = set_step(&args)?;
    run_step("set", step, &args.edit, config, output)
}

/// The step `grafter set` runs, chosen by file kind.
fn set_step(args: &SetArgs) -> CliResult<Step> {
    let path = args.file.clone();
    let key = KeyPath::Dotted(args.key.clone());
    let value = if args.string {
        toml::Value::String(args.value.clone())
    } else {
        literal(&args.value)
    };
    let text = args.value.clone();

    let step = match (FileKind::from_path(&args.file), args.append) {
        (FileKind::Json, false) => Step::JsonSet { path, key, value },
        (FileKind::Json, true) => Step::JsonAppend { path, key, value },
        (FileKind::Toml, false) => Step::TomlSet { path, key, value },
        (FileKind::Toml, true) => Step::TomlAppend { path, key, value },
        (FileKind::Yaml, false) => Step::YamlSet { path, key, value: text },
        (FileKind::Yaml, true) => Step::YamlAppend { path, key, value: text },
        (other, _) => {
            return Err(CliError::UnsupportedFile {
                command: "set",
                path,
                reason: format!("{other} files have no keys; use a .json, .toml or .yaml file"),
            });
        }
    };
    Ok(step)
}

fn require_script(command: &'static str, file: &str) -> CliResult<()> {
    match FileKind::from_path(file) {
        FileKind::Script | FileKind::Component => Ok(()),
        other => Err(CliError::UnsupportedFile {
            command,
            path: file.to_string(),
            reason: format!("expected a script or component file, found a {other} file"),
        }),
    }
}

fn run_step(
    addon: &str,
    step: Step,
    edit: &EditArgs,
    config: &AppConfig,
    output: &OutputManager,
) -> CliResult<()> {
    let mut plan = EditPlan::new();
    let path = step.path().to_string();
    plan.register_file_edit(addon, &path, move |content| step.apply(content))
        .map_err(GrafterError::from)?;
    run_plan(&plan, edit, config, FailurePolicy::Abort, output)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn set_args(file: &str, value: &str, append: bool, string: bool) -> SetArgs {
        SetArgs {
            file: file.into(),
            key: "a.b".into(),
            value: value.into(),
            append,
            string,
            edit: EditArgs {
                root: PathBuf::from("."),
                dry_run: true,
            },
        }
    }

    #[test]
    fn set_picks_step_by_kind() {
        let step = set_step(&set_args("package.json", "true", false, false)).unwrap();
        assert_eq!(
            step,
            Step::JsonSet {
                path: "package.json".into(),
                key: KeyPath::Dotted("a.b".into()),
                value: toml::Value::Boolean(true),
            }
        );

        let step = set_step(&set_args("Cargo.toml", "1", true, true)).unwrap();
        assert!(matches!(
            step,
            Step::TomlAppend { value: toml::Value::String(ref s), .. } if s == "1"
        ));

        let step = set_step(&set_args("ci.yml", "node 20", false, false)).unwrap();
        assert!(matches!(step, Step::YamlSet { ref value, .. } if value == "node 20"));
    }

    #[test]
    fn set_rejects_scripts() {
        let err = set_step(&set_args("vite.config.ts", "1", false, false)).unwrap_err();
        assert!(matches!(err, CliError::UnsupportedFile { command: "set", .. }));
    }

    #[test]
    fn import_requires_script_files() {
        assert!(require_script("import", "src/App.svelte").is_ok());
        assert!(require_script("import", "package.json").is_err());
    }
}
