//! Plain-text and JSON rendering of research output.
//!
//! The text output is deliberately simple: section headers and bullet
//! lists, suitable for a terminal. `--json` bypasses all of it.

use prodscout_core::{
    FinalReport, ProductComparison, ProductInfo, ProductRecommendations, ResearchFailure,
    ResearchResults,
};

/// Render a full research run.
pub fn results(results: &ResearchResults, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(results)?);
        return Ok(());
    }

    for report in &results.reports {
        println!("# {}", report.product_name);
        println!();

        // The raw report text is validated JSON; fall back to printing
        // it verbatim if it somehow fails to parse here.
        match serde_json::from_str::<FinalReport>(&report.report) {
            Ok(parsed) => {
                println!("{}", parsed.introduction);
                println!();
                for feature in &parsed.features {
                    println!("## {} ({})", feature.name, feature.importance);
                    println!("{}", feature.analysis);
                    println!();
                }
                if !parsed.limitations.is_empty() {
                    println!("## Limitations");
                    for limitation in &parsed.limitations {
                        println!("- {limitation}");
                    }
                    println!();
                }
                println!("## Conclusion");
                println!("{}", parsed.conclusion);
            }
            Err(_) => println!("{}", report.report),
        }

        println!();
        println!("## Sources");
        for video in &report.video_results {
            println!("- video: {} ({})", video.title, video.id);
        }
        println!("- web and forum summaries included in --json output");
        println!();
    }
    Ok(())
}

/// Render a failed run: the message plus the diagnostic API log.
pub fn failure(failure: &ResearchFailure, json: bool) -> anyhow::Result<()> {
    if json {
        let payload = serde_json::json!({
            "error": failure.message,
            "logs": failure.logs,
        });
        eprintln!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    eprintln!("research failed: {}", failure.message);
    if !failure.logs.is_empty() {
        eprintln!();
        eprintln!("API log ({} entries):", failure.logs.len());
        for entry in &failure.logs {
            let status = entry
                .response
                .as_ref()
                .map(|r| r.status.to_string())
                .unwrap_or_else(|| "-".to_string());
            let outcome = entry.error.as_deref().unwrap_or("ok");
            eprintln!(
                "  {} {:?} {} {} -> {} ({})",
                entry.timestamp.format("%H:%M:%S"),
                entry.service,
                entry.request.method,
                entry.endpoint,
                status,
                outcome,
            );
        }
    }
    Ok(())
}

/// Render a product-info answer.
pub fn info(info: &ProductInfo, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(info)?);
        return Ok(());
    }
    println!("# {}", info.product_name);
    for consideration in &info.considerations {
        println!("- {}: {}", consideration.key, consideration.value);
    }
    Ok(())
}

/// Render a comparison answer.
pub fn comparison(comparison: &ProductComparison, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(comparison)?);
        return Ok(());
    }
    println!("# Alternatives to {}", comparison.main_product);
    for alternative in &comparison.alternatives {
        println!();
        println!("## {}", alternative.name);
        for consideration in &alternative.considerations {
            println!("- {}: {}", consideration.key, consideration.value);
        }
    }
    Ok(())
}

/// Render a recommendations answer.
pub fn recommendations(recommendations: &ProductRecommendations, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(recommendations)?);
        return Ok(());
    }
    println!("# Recommendations");
    for recommendation in &recommendations.recommendations {
        println!();
        println!("## {}", recommendation.name);
        for consideration in &recommendation.considerations {
            println!("- {}: {}", consideration.key, consideration.value);
        }
    }
    Ok(())
}
