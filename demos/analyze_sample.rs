//! Analyze a sample image and print the export document.
//!
//! Run with: `cargo run --example analyze_sample`
//!
//! Requires `GOOGLE_API_KEY` environment variable.

use visionary_scribe::samples::{SAMPLE_GALLERY, SAMPLE_IMAGES};
use visionary_scribe::{
    ConfigChange, CreativeStyle, GeminiAnalyzer, GeminiClient, SessionMachine, Transition,
    VariationCount,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> visionary_scribe::Result<()> {
    let client = GeminiClient::builder().build()?;
    let session = SessionMachine::builder()
        .analyzer(GeminiAnalyzer::new(client))
        .build()?;

    if let Transition::Failed(e) = session.submit_image(SAMPLE_IMAGES[0], SAMPLE_GALLERY).await {
        eprintln!("Could not load image: {}", e.user_message());
        return Err(e);
    }

    let _ = session.update_config(ConfigChange::Style(CreativeStyle::Poetic));
    let _ = session.update_config(ConfigChange::Count(VariationCount::Five));

    if let Transition::Failed(e) = session.generate().await {
        eprintln!("Analysis failed: {}", e.user_message());
        return Err(e);
    }

    if let Some(text) = session.export() {
        println!("{}", text);
    }

    Ok(())
}
