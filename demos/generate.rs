//! Demonstrates building an orchestrator from environment configuration.
//!
//! Run with: `cargo run --example generate -- "A lighthouse at dusk"`
//!
//! Requires the key of the selected providers. With the defaults
//! (`GENBRIDGE_TEXT_PROVIDER` and `GENBRIDGE_IMAGE_PROVIDER` unset) that is
//! `HF_API_KEY`.

use genbridge::{Config, GenerationRequest, Orchestrator};

#[tokio::main]
async fn main() -> genbridge::Result<()> {
    let prompt = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "A lighthouse at dusk, oil painting".to_string());

    let config = Config::from_env()?;
    println!(
        "Text: {} / Image: {} (timeout {:?})",
        config.text_provider.display_name(),
        config.image_provider.display_name(),
        config.timeout
    );

    let orchestrator = Orchestrator::from_config(&config)?;
    let request = GenerationRequest::new(prompt).with_max_tokens(120);
    let result = orchestrator.generate(&request).await?;

    match (&result.image_base64, &result.image_url) {
        (Some(data_uri), _) => println!("Inline image: {} chars", data_uri.len()),
        (None, Some(url)) => println!("Image URL: {url}"),
        _ => println!("No image returned"),
    }
    if let Some(note) = &result.note {
        println!("Note: {note}");
    }

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
