//! Describes the provisioned shape of the service.

use cryptopay_core::api::{Route, ROUTES};
use cryptopay_core::throttle::ThrottleLimits;
use serde::Serialize;

use crate::dynamodb::config::{cryptopay_table_config, TableConfig};
use crate::prelude::*;

/// Print the table, index, usage plan and routes the service runs with.
#[derive(Debug, clap::Parser)]
pub struct StackCommand {
    /// Print as JSON instead of text.
    #[arg(long)]
    pub json: bool,

    /// Table name to describe.
    #[arg(long, env = "MAIN_TABLE")]
    pub table_name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IndexDescription {
    name: String,
    hash_key: String,
    range_key: Option<String>,
    projection: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RouteDescription {
    method: &'static str,
    path: &'static str,
    handler: &'static str,
    capability: &'static str,
    success_status: u16,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StackDescription {
    table_name: String,
    hash_key: String,
    range_key: Option<String>,
    billing_mode: &'static str,
    indexes: Vec<IndexDescription>,
    api_key_header: &'static str,
    usage_plan: ThrottleLimits,
    routes: Vec<RouteDescription>,
}

impl From<&Route> for RouteDescription {
    fn from(route: &Route) -> Self {
        Self {
            method: route.method.as_str(),
            path: route.path,
            handler: route.operation.name(),
            capability: route.capability().as_str(),
            success_status: route.success_status,
        }
    }
}

fn describe(table: &TableConfig, usage_plan: ThrottleLimits) -> StackDescription {
    StackDescription {
        table_name: table.table_name.clone(),
        hash_key: table.partition_key.name.clone(),
        range_key: table.sort_key.as_ref().map(|k| k.name.clone()),
        billing_mode: "PAY_PER_REQUEST",
        indexes: table
            .gsis
            .iter()
            .map(|gsi| IndexDescription {
                name: gsi.name.clone(),
                hash_key: gsi.partition_key.name.clone(),
                range_key: gsi.sort_key.as_ref().map(|k| k.name.clone()),
                projection: "ALL",
            })
            .collect(),
        api_key_header: "x-api-key",
        usage_plan,
        routes: ROUTES.iter().map(RouteDescription::from).collect(),
    }
}

fn format_stack(stack: &StackDescription) -> Vec<String> {
    let key = |hash: &str, range: &Option<String>| match range {
        Some(range) => format!("{hash} (HASH), {range} (RANGE)"),
        None => format!("{hash} (HASH)"),
    };

    let mut lines = vec![
        format!("Table: {} [{}]", stack.table_name, stack.billing_mode),
        format!("  Key: {}", key(&stack.hash_key, &stack.range_key)),
    ];
    for index in &stack.indexes {
        lines.push(format!(
            "  Index: {} on {} [{}]",
            index.name,
            key(&index.hash_key, &index.range_key),
            index.projection
        ));
    }
    lines.push(format!(
        "Usage plan: {} req/s, burst {}, key header {}",
        stack.usage_plan.rate_per_sec, stack.usage_plan.burst, stack.api_key_header
    ));
    lines.push("Routes:".to_string());
    for route in &stack.routes {
        lines.push(format!(
            "  {:<4} {:<22} {:<16} {}",
            route.method, route.path, route.handler, route.capability
        ));
    }
    lines
}

/// Main entry point for the stack command.
pub fn run(command: StackCommand, _global: crate::Global) -> anyhow::Result<()> {
    let mut table = cryptopay_table_config();
    if let Some(name) = &command.table_name {
        table = table.with_table_name(name);
    }
    let stack = describe(&table, ThrottleLimits::default());

    if command.json {
        aprintln!("{}", serde_json::to_string_pretty(&stack)?);
        return Ok(());
    }

    for (i, line) in format_stack(&stack).into_iter().enumerate() {
        if i == 0 || line.ends_with(':') {
            aprintln!("{}", p_c(&line));
        } else {
            aprintln!("{}", line);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describes_every_route() {
        let stack = describe(&cryptopay_table_config(), ThrottleLimits::default());

        assert_eq!(stack.routes.len(), 8);
        let writers: Vec<&str> = stack
            .routes
            .iter()
            .filter(|r| r.capability == "read-write")
            .map(|r| r.handler)
            .collect();
        assert_eq!(writers, ["CreateUser", "CreatePayment"]);
        assert_eq!(stack.indexes[0].name, "paymentId-index");
    }

    #[test]
    fn test_text_output() {
        let stack = describe(&cryptopay_table_config(), ThrottleLimits::default());

        let lines = format_stack(&stack);

        assert_eq!(lines[0], "Table: CryptoPaymentTable [PAY_PER_REQUEST]");
        assert_eq!(lines[1], "  Key: pk (HASH), sk (RANGE)");
        assert_eq!(
            lines[2],
            "  Index: paymentId-index on paymentId (HASH), sk (RANGE) [ALL]"
        );
        assert_eq!(
            lines[3],
            "Usage plan: 100 req/s, burst 200, key header x-api-key"
        );
    }
}
