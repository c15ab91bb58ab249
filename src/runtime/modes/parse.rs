//! Parse mode
//!
//! Runs one parser over a User-Agent string without touching storage.

use anyhow::Result;
use serde::Serialize;

use crate::config::ParserStrategy;
use crate::parser::build_parser;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseOutput {
    pub parser: String,
    pub os_name: String,
    pub os_version: String,
    pub browser_name: String,
    pub browser_version: String,
    pub fingerprint: String,
}

pub fn parse_user_agent(user_agent: &str, strategy: ParserStrategy) -> Result<ParseOutput> {
    let parser = build_parser(strategy);
    let ua = parser.parse(user_agent)?;
    Ok(ParseOutput {
        parser: parser.name().to_string(),
        os_name: ua.os_name().to_string(),
        os_version: ua.os_version().to_string(),
        browser_name: ua.browser_name().to_string(),
        browser_version: ua.browser_version().to_string(),
        fingerprint: ua.fingerprint(),
    })
}

pub fn run_parse(user_agent: &str, strategy: ParserStrategy) -> Result<()> {
    let output = parse_user_agent(user_agent, strategy)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
