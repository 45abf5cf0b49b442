use hallucination_tracker_lib::models::round2;
use hallucination_tracker_lib::services::data_loader::format_float;
use hallucination_tracker_lib::services::detection::risk_score;
use hallucination_tracker_lib::services::{normalize_whitespace, HallucinationDetector};
use serde::Serialize;

fn preview(s: &str, max_chars: usize) -> String {
    let mut out: String = s.chars().take(max_chars).collect();
    if s.chars().count() > max_chars {
        out.push_str("...");
    }
    out
}

fn parse_arg_value(args: &[String], key: &str) -> Option<String> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn parse_arg_values(args: &[String], key: &str) -> Vec<String> {
    args.windows(2)
        .filter(|w| w[0] == key)
        .map(|w| w[1].clone())
        .collect()
}

fn main() -> Result<(), String> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!(
            "Usage:\n  cargo run --bin score_text -- <text> [--phrase <p>]... [--out <json_path>]\n\nNotes:\n  - Each --phrase replaces the default uncertainty phrase list.\n  - Text is whitespace-normalized before scoring."
        );
        return Ok(());
    }

    let text = normalize_whitespace(&args[1]);
    let phrases = parse_arg_values(&args, "--phrase");
    let out_path = parse_arg_value(&args, "--out");

    let detector = if phrases.is_empty() {
        HallucinationDetector::default()
    } else {
        HallucinationDetector::with_phrases(phrases)
    };

    let uncertainty = detector.contains_uncertainty(&text);
    let numeric = detector.has_numeric_claim(&text);
    let score = detector.hallucination_score(&text);
    let result = detector.score_response(&text);
    let risk = risk_score(&result);

    println!("Text: {}", preview(&text, 120));
    println!("Chars: {}", text.chars().count());
    println!("Phrases: {}", detector.phrases().join(", "));
    println!("Uncertainty: {}", if uncertainty { "yes" } else { "no" });
    println!("Numeric claim: {}", if numeric { "yes" } else { "no" });
    println!();
    println!(
        "score={} flag={} confidence={} label={} risk={}",
        format_float(round2(score)),
        result.hallucination_flag,
        format_float(result.confidence_score),
        result.final_label,
        format_float(risk)
    );

    if let Some(out_path) = out_path {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Output {
            text: String,
            chars: usize,
            contains_uncertainty: bool,
            has_numeric_claim: bool,
            hallucination_score: f64,
            hallucination_flag: u8,
            confidence_score: f64,
            final_label: String,
            hallucination_risk_score: f64,
        }

        let out = Output {
            chars: text.chars().count(),
            text,
            contains_uncertainty: uncertainty,
            has_numeric_claim: numeric,
            hallucination_score: score,
            hallucination_flag: result.hallucination_flag,
            confidence_score: result.confidence_score,
            final_label: result.final_label.to_string(),
            hallucination_risk_score: risk,
        };

        let json = serde_json::to_string_pretty(&out).map_err(|e| e.to_string())?;
        std::fs::write(&out_path, json).map_err(|e| format!("write out failed: {}", e))?;
        println!();
        println!("Wrote JSON: {}", out_path);
    }

    Ok(())
}
