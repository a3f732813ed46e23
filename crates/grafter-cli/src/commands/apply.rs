//! `grafter apply`: run recipe files against a project.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use grafter_adapters::{Recipe, RecipeLoader};
use grafter_core::{
    application::{EditPlan, FailurePolicy},
    error::GrafterError,
};

use crate::{
    cli::ApplyArgs,
    commands::run_plan,
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

#[instrument(skip_all, fields(recipes = args.recipes.len()))]
pub fn execute(args: ApplyArgs, config: &AppConfig, output: &OutputManager) -> CliResult<()> {
    let recipe_dir = PathBuf::from(&config.edits.recipe_dir);
    let recipes = load_recipes(&args.recipes, &recipe_dir)?;

    let mut plan = EditPlan::new();
    for recipe in &recipes {
        recipe.register(&mut plan).map_err(GrafterError::from)?;
    }
    info!(recipes = recipes.len(), edits = plan.len(), "recipes registered");

    let dry_run = args.edit.dry_run || config.edits.dry_run;
    if !dry_run && !args.yes && should_prompt(output) && !confirm(&recipes, &args.edit.root)? {
        return Err(CliError::Cancelled);
    }

    let policy = if args.keep_going || config.edits.keep_going {
        FailurePolicy::SkipAddon
    } else {
        FailurePolicy::Abort
    };
    run_plan(&plan, &args.edit, config, policy, output)?;
    Ok(())
}

/// Resolve recipe arguments. Directories contribute every recipe inside
/// them; with no arguments the configured recipe directory is used.
fn load_recipes(paths: &[PathBuf], recipe_dir: &Path) -> CliResult<Vec<Recipe>> {
    let defaulted;
    let paths = if paths.is_empty() {
        defaulted = [recipe_dir.to_path_buf()];
        &defaulted[..]
    } else {
        paths
    };

    let mut recipes = Vec::new();
    for path in paths {
        if path.is_dir() {
            recipes.extend(RecipeLoader::new(path).load_all()?);
        } else if path.is_file() {
            recipes.push(RecipeLoader::load_file(path)?);
        } else {
            return Err(CliError::RecipeNotFound { path: path.clone() });
        }
    }
    debug!(count = recipes.len(), "recipes loaded");

    if recipes.is_empty() {
        let searched = paths.first().cloned().unwrap_or_else(|| recipe_dir.to_path_buf());
        return Err(CliError::NoRecipes { searched });
    }
    Ok(recipes)
}

fn should_prompt(output: &OutputManager) -> bool {
    !output.is_quiet() && !output.is_json() && std::io::stdin().is_terminal()
}

#[cfg(feature = "interactive")]
fn confirm(recipes: &[Recipe], root: &Path) -> CliResult<bool> {
    let names: Vec<&str> = recipes.iter().map(Recipe::name).collect();
    dialoguer::Confirm::new()
        .with_prompt(format!(
            "Apply {} to {}?",
            names.join(", "),
            root.display()
        ))
        .default(true)
        .interact()
        .map_err(|e| CliError::InvalidInput {
            message: "confirmation prompt failed".into(),
            source: Some(Box::new(e)),
        })
}

#[cfg(not(feature = "interactive"))]
fn confirm(_recipes: &[Recipe], _root: &Path) -> CliResult<bool> {
    Ok(true)
}
