//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text, and value enums.  No business logic lives here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

pub mod global;
pub use global::{GlobalArgs, OutputFormat};

// ── Top-level CLI ─────────────────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(
    name    = "grafter",
    bin_name = "grafter",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "Merge generated code into existing source files",
    long_about = "Grafter merges imports, config properties, plugins, markup and \
                  config keys into existing files. Every edit is idempotent and \
                  leaves untouched code, comments and formatting alone.",
    after_help = "EXAMPLES:\n\
        \x20 grafter inspect src\n\
        \x20 grafter import src/app.ts --from svelte/store --named writable\n\
        \x20 grafter plugin vite.config.ts 'tailwindcss()' --import-default tailwindcss --import-from @tailwindcss/vite\n\
        \x20 grafter set package.json scripts.lint 'eslint .'\n\
        \x20 grafter apply recipes/tailwind.toml --dry-run",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show the formatting conventions grafter infers for files.
    #[command(
        visible_alias = "i",
        after_help = "EXAMPLES:\n\
            \x20 grafter inspect                 # whole project\n\
            \x20 grafter inspect vite.config.ts\n\
            \x20 grafter inspect src --all       # include plain-text files"
    )]
    Inspect(InspectArgs),

    /// Add an import to a script or component.
    #[command(after_help = "EXAMPLES:\n\
            \x20 grafter import src/app.ts --from pkg --default pkg\n\
            \x20 grafter import src/app.ts --from pkg --named a,b\n\
            \x20 grafter import src/app.d.ts --from ./types --named User --type-only\n\
            \x20 grafter import src/app.ts --from ./polyfill     # side-effect import")]
    Import(ImportArgs),

    /// Add a plugin call to a config file's plugin list.
    #[command(after_help = "EXAMPLES:\n\
            \x20 grafter plugin vite.config.ts 'tailwindcss()' \\\n\
            \x20     --import-from @tailwindcss/vite --import-default tailwindcss")]
    Plugin(PluginArgs),

    /// Set or append a key in a JSON, TOML or YAML file.
    #[command(after_help = "EXAMPLES:\n\
            \x20 grafter set package.json scripts.lint 'eslint .'\n\
            \x20 grafter set tsconfig.json compilerOptions.strict true\n\
            \x20 grafter set pnpm-workspace.yaml onlyBuiltDependencies esbuild --append\n\
            \x20 grafter set package.json version 1.0 --string")]
    Set(SetArgs),

    /// Run recipe files.
    #[command(
        visible_alias = "a",
        after_help = "EXAMPLES:\n\
            \x20 grafter apply recipes/tailwind.toml\n\
            \x20 grafter apply recipes/ --keep-going\n\
            \x20 grafter apply --dry-run           # recipes from edits.recipe_dir"
    )]
    Apply(ApplyArgs),

    /// Initialise a grafter configuration file.
    #[command(after_help = "EXAMPLES:\n\
            \x20 grafter init           # platform config directory\n\
            \x20 grafter init --local   # .grafter.toml in the current directory")]
    Init(InitArgs),

    /// Generate shell completion scripts.
    #[command(after_help = "EXAMPLES:\n\
            \x20 grafter completions bash > ~/.local/share/bash-completion/completions/grafter\n\
            \x20 grafter completions zsh  > ~/.zfunc/_grafter\n\
            \x20 grafter completions fish > ~/.config/fish/completions/grafter.fish")]
    Completions(CompletionsArgs),

    /// Manage the grafter configuration.
    #[command(
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 grafter config get edits.dry_run\n\
            \x20 grafter config set output.format json\n\
            \x20 grafter config list"
    )]
    Config(ConfigCommands),
}

// ── shared edit flags ─────────────────────────────────────────────────────────

/// Flags of every command that writes files.
#[derive(Debug, Args)]
pub struct EditArgs {
    /// Project root that file paths are relative to.
    #[arg(
        short = 'C',
        long = "dir",
        value_name = "DIR",
        default_value = ".",
        help = "Project root"
    )]
    pub root: PathBuf,

    /// Print the resulting files instead of writing them.
    #[arg(long = "dry-run", help = "Show the result without writing files")]
    pub dry_run: bool,
}

// ── inspect ───────────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct InspectArgs {
    /// File or directory to inspect.
    #[arg(value_name = "PATH", default_value = ".")]
    pub path: PathBuf,

    #[arg(long = "all", help = "Include files without a structural adapter")]
    pub all: bool,
}

// ── import ────────────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Script or component file, relative to the project root.
    #[arg(value_name = "FILE")]
    pub file: String,

    #[arg(long = "from", value_name = "MODULE", help = "Module to import from")]
    pub from: String,

    #[arg(long = "default", value_name = "NAME", help = "Default binding")]
    pub default: Option<String>,

    #[arg(long = "namespace", value_name = "NAME", help = "Namespace binding (`* as NAME`)")]
    pub namespace: Option<String>,

    #[arg(
        long = "named",
        value_name = "NAMES",
        value_delimiter = ',',
        help = "Named bindings, comma separated"
    )]
    pub named: Vec<String>,

    #[arg(long = "type-only", requires = "named", help = "Import the named bindings as types")]
    pub type_only: bool,

    #[command(flatten)]
    pub edit: EditArgs,
}

// ── plugin ────────────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PluginArgs {
    /// Config file, relative to the project root.
    #[arg(value_name = "FILE")]
    pub file: String,

    /// Plugin expression, e.g. `tailwindcss()`.
    #[arg(value_name = "EXPR")]
    pub expr: String,

    #[arg(long = "import-from", value_name = "MODULE", help = "Module providing the plugin")]
    pub import_from: Option<String>,

    #[arg(
        long = "import-default",
        value_name = "NAME",
        requires = "import_from",
        help = "Default binding for the plugin import"
    )]
    pub import_default: Option<String>,

    #[arg(
        long = "import-named",
        value_name = "NAMES",
        value_delimiter = ',',
        requires = "import_from",
        help = "Named bindings for the plugin import"
    )]
    pub import_named: Vec<String>,

    #[arg(long = "property", value_name = "NAME", help = "Array property (default: plugins)")]
    pub property: Option<String>,

    #[arg(long = "prepend", help = "Insert at the start of the list")]
    pub prepend: bool,

    #[command(flatten)]
    pub edit: EditArgs,
}

// ── set ───────────────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SetArgs {
    /// JSON, TOML or YAML file, relative to the project root.
    #[arg(value_name = "FILE")]
    pub file: String,

    /// Dotted key path, e.g. `scripts.lint`.
    #[arg(value_name = "KEY")]
    pub key: String,

    /// Value, read as a TOML literal (`true`, `3`, `["a"]`) when it parses
    /// as one, else as a string.
    #[arg(value_name = "VALUE", allow_hyphen_values = true)]
    pub value: String,

    #[arg(long = "append", help = "Append to the array at KEY instead of replacing it")]
    pub append: bool,

    #[arg(long = "string", help = "Always treat VALUE as a string")]
    pub string: bool,

    #[command(flatten)]
    pub edit: EditArgs,
}

// ── apply ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Recipe files or directories of recipes.
    #[arg(value_name = "RECIPE")]
    pub recipes: Vec<PathBuf>,

    /// Skip a failing recipe's remaining edits instead of stopping.
    #[arg(long = "keep-going", help = "Continue with other recipes when one fails")]
    pub keep_going: bool,

    #[arg(short = 'y', long = "yes", help = "Apply without confirmation")]
    pub yes: bool,

    #[command(flatten)]
    pub edit: EditArgs,
}

// ── init ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Write `.grafter.toml` in the current directory.
    #[arg(
        long = "local",
        help = "Create local configuration in current directory"
    )]
    pub local: bool,

    #[arg(short = 'f', long = "force", help = "Overwrite existing configuration")]
    pub force: bool,
}

// ── completions ───────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: Shell,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ── config subcommands ────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the value of a configuration key.
    Get {
        /// Dotted key path, e.g. `edits.dry_run`.
        key: String,
    },
    /// Set a configuration key in the active configuration file.
    Set {
        /// Dotted key path.
        key: String,
        /// New value.
        value: String,
    },
    /// Print all configuration values.
    List,
    /// Print the path to the active configuration file.
    Path,
}

// ── tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_import_command() {
        let cli = Cli::parse_from([
            "grafter", "import", "src/app.ts", "--from", "pkg", "--named", "a,b", "-C", "web",
        ]);
        let Commands::Import(args) = cli.command else {
            panic!("expected Import command");
        };
        assert_eq!(args.named, ["a", "b"]);
        assert_eq!(args.edit.root, PathBuf::from("web"));
        assert!(!args.edit.dry_run);
    }

    #[test]
    fn type_only_requires_named() {
        let result = Cli::try_parse_from([
            "grafter", "import", "a.ts", "--from", "pkg", "--type-only",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn set_accepts_negative_values() {
        let cli = Cli::parse_from(["grafter", "set", "a.json", "offset", "-1"]);
        let Commands::Set(args) = cli.command else {
            panic!("expected Set command");
        };
        assert_eq!(args.value, "-1");
    }

    #[test]
    fn apply_alias_and_recipes() {
        let cli = Cli::parse_from(["grafter", "a", "one.toml", "dir", "--keep-going"]);
        let Commands::Apply(args) = cli.command else {
            panic!("expected Apply command");
        };
        assert_eq!(args.recipes.len(), 2);
        assert!(args.keep_going);
    }

    #[test]
    fn quiet_and_verbose_conflict() {
        let result = Cli::try_parse_from(["grafter", "--quiet", "--verbose", "inspect"]);
        assert!(result.is_err());
    }
}
