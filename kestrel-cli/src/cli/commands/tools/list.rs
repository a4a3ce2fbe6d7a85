use crate::cli::output::*;
use crate::cli::CommandContext;
use clap::Args;
use colored::*;
use comfy_table::Cell;
use kestrel_tools::ToolManager;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

pub fn run(args: ListArgs, ctx: &CommandContext) -> anyhow::Result<()> {
    let manager = ToolManager::new();
    let tools = manager.list_all_tools(&ctx.config.alignment);

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&tools)?);
        return Ok(());
    }

    section_header("Alignment tools");
    let mut table = create_standard_table();
    table.set_header(vec![
        header_cell("Tool"),
        header_cell("Version"),
        header_cell("Status"),
        header_cell("Path"),
    ]);

    for status in &tools {
        let state = match (&status.binary_path, &status.version) {
            (Some(_), Some(_)) => "✓ available".green().to_string(),
            (Some(_), None) => "⚠ no version".yellow().to_string(),
            (None, _) => "✗ missing".red().to_string(),
        };
        table.add_row(vec![
            Cell::new(status.tool.display_name()),
            Cell::new(status.version.as_deref().unwrap_or("-")),
            Cell::new(state),
            Cell::new(
                status
                    .binary_path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
        ]);
    }
    println!("{}", table);

    info(&format!("Configured aligner: {}", ctx.config.alignment.tool));
    if tools.iter().all(|t| t.binary_path.is_none()) {
        info(&format!(
            "Install MAFFT or MUSCLE on PATH, under {}, or set [alignment] binary",
            manager.tools_dir().display()
        ));
    }
    Ok(())
}
