//! Templates command - list the template catalog.

use console::style;

use invr_core::templates::TemplateCatalog;

use super::load_config;

pub async fn run(config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let catalog = TemplateCatalog::new(config.templates.clone());

    println!("{}", style("Available templates:").bold());
    for template in catalog.templates() {
        println!(
            "  {:<13} {}",
            style(template.name()).cyan(),
            template.description()
        );
    }

    println!();
    println!(
        "Invoices with more than {} line items use {}; vendors whose name contains \"{}\" use {}.",
        config.templates.detailed_line_item_threshold,
        style("detailed").cyan(),
        config.templates.professional_keyword,
        style("professional").cyan()
    );

    Ok(())
}
