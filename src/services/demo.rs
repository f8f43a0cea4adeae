//! Demo data set.
//!
//! Seeds two prompts with a short history and a few label moves, enough to
//! exercise `status`, `label history` and both diff modes by hand.

use crate::Result;
use crate::models::NewVersion;
use crate::services::PromptLedger;

/// Author recorded on every demo version.
pub const DEMO_AUTHOR: &str = "demo";

/// Seeds the demo prompts `onboarding_email` and `support_reply`.
///
/// Seeding appends, so running it twice produces versions 3 and 4.
///
/// # Errors
///
/// Returns the first error raised by the ledger.
pub fn seed_demo(ledger: &PromptLedger) -> Result<()> {
    ledger.add(
        "onboarding_email",
        NewVersion::new("Write a friendly onboarding email.\nKeep it concise.")
            .with_reason("initial draft")
            .with_author(DEMO_AUTHOR)
            .with_tags(["draft", "marketing"])
            .with_env("dev")
            .with_metric("score", 0.7),
    )?;
    ledger.add(
        "onboarding_email",
        NewVersion::new("Write a friendly onboarding email.\nKeep it concise and warm.")
            .with_reason("tone update")
            .with_author(DEMO_AUTHOR)
            .with_tags(["marketing"])
            .with_env("staging")
            .with_metric("score", 0.82),
    )?;
    ledger.set_label("onboarding_email", 1, "prod")?;
    ledger.set_label("onboarding_email", 2, "staging")?;
    ledger.set_label("onboarding_email", 2, "prod")?;

    ledger.add(
        "support_reply",
        NewVersion::new("Reply to the customer with empathy and a clear next step.")
            .with_reason("baseline")
            .with_author(DEMO_AUTHOR)
            .with_tags(["support"])
            .with_env("dev")
            .with_metric("score", 0.6),
    )?;
    ledger.add(
        "support_reply",
        NewVersion::new(
            "Reply with empathy and a clear next step. Ask one clarifying question.",
        )
        .with_reason("add clarification step")
        .with_author(DEMO_AUTHOR)
        .with_tags(["support", "tone"])
        .with_env("prod")
        .with_metric("score", 0.9),
    )?;
    ledger.set_label("support_reply", 2, "prod")?;

    tracing::info!("seeded demo data");
    Ok(())
}
