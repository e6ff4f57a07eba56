//! Decode command implementation

use crate::cli::{read_arg_or_stdin, DecodeArgs};
use crate::grading::decode;

/// Handle `examen decode`; returns the text to print.
pub fn handle_decode(args: &DecodeArgs) -> Result<String, Box<dyn std::error::Error>> {
    let text = read_arg_or_stdin(&args.text)?;
    Ok(render(&text, args.json))
}

fn render(text: &str, json: bool) -> String {
    let outcome = decode(text);
    if json {
        serde_json::json!({
            "outcome": outcome,
            "code": outcome.code(),
        })
        .to_string()
    } else {
        outcome.to_string()
    }
}
