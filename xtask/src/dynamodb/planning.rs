//! Pure functions for calculating deployment plans (Functional Core).

use super::config::{GsiConfig, TableConfig};

/// Represents the current state of a table.
#[derive(Debug, Clone)]
pub struct TableState {
    pub status: TableStatus,
    /// Hash and range key names of the existing table.
    pub key_schema: (String, Option<String>),
    pub gsis: Vec<GsiState>,
}

/// Table status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStatus {
    Active,
    Creating,
    Updating,
    Deleting,
}

/// GSI state.
#[derive(Debug, Clone)]
pub struct GsiState {
    pub name: String,
    pub status: GsiStatus,
}

/// GSI status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GsiStatus {
    Active,
    Creating,
    Updating,
    Deleting,
}

/// Planned changes for deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployPlan {
    /// Table doesn't exist, needs to be created.
    CreateTable { config: TableConfig },
    /// Table exists, GSIs need to be added.
    AddGsis {
        table_name: String,
        gsis_to_add: Vec<GsiConfig>,
    },
    /// Table exists with a different primary key; it cannot be updated in place.
    KeySchemaMismatch {
        table_name: String,
        found: (String, Option<String>),
        expected: (String, Option<String>),
    },
    /// Table is up to date, no changes needed.
    NoChanges { table_name: String },
}

/// Plan for destroying a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestroyPlan {
    /// Table exists and will be deleted.
    DeleteTable { table_name: String },
    /// Table doesn't exist, nothing to do.
    AlreadyGone { table_name: String },
}

fn expected_key_schema(desired: &TableConfig) -> (String, Option<String>) {
    (
        desired.partition_key.name.clone(),
        desired.sort_key.as_ref().map(|k| k.name.clone()),
    )
}

/// Pure function: Calculate what changes are needed to reach desired state.
pub fn calculate_deploy_plan(current: Option<&TableState>, desired: &TableConfig) -> DeployPlan {
    let Some(state) = current else {
        return DeployPlan::CreateTable {
            config: desired.clone(),
        };
    };

    let expected = expected_key_schema(desired);
    if state.key_schema != expected {
        return DeployPlan::KeySchemaMismatch {
            table_name: desired.table_name.clone(),
            found: state.key_schema.clone(),
            expected,
        };
    }

    let gsis_to_add: Vec<GsiConfig> = desired
        .gsis
        .iter()
        .filter(|gsi| !state.gsis.iter().any(|g| g.name == gsi.name))
        .cloned()
        .collect();

    if gsis_to_add.is_empty() {
        DeployPlan::NoChanges {
            table_name: desired.table_name.clone(),
        }
    } else {
        DeployPlan::AddGsis {
            table_name: desired.table_name.clone(),
            gsis_to_add,
        }
    }
}

/// Pure function: Calculate destroy plan.
pub fn calculate_destroy_plan(current: Option<&TableState>, table_name: &str) -> DestroyPlan {
    match current {
        Some(_) => DestroyPlan::DeleteTable {
            table_name: table_name.to_string(),
        },
        None => DestroyPlan::AlreadyGone {
            table_name: table_name.to_string(),
        },
    }
}

fn format_key_schema((hash, range): &(String, Option<String>)) -> String {
    match range {
        Some(range) => format!("{hash} (HASH), {range} (RANGE)"),
        None => format!("{hash} (HASH)"),
    }
}

fn format_gsi(gsi: &GsiConfig, prefix: &str) -> Vec<String> {
    let mut lines = vec![
        format!("{prefix}+ GSI: {}", gsi.name),
        format!("{prefix}  Partition key: {} (S)", gsi.partition_key.name),
    ];
    if let Some(sk) = &gsi.sort_key {
        lines.push(format!("{prefix}  Sort key: {} (S)", sk.name));
    }
    lines.push(format!("{prefix}  Projection: ALL"));
    lines
}

/// Pure function: Format a deploy plan for display.
pub fn format_deploy_plan(plan: &DeployPlan) -> Vec<String> {
    match plan {
        DeployPlan::CreateTable { config } => {
            let mut lines = vec![
                format!("+ Create table: {}", config.table_name),
                format!("  Partition key: {} (S)", config.partition_key.name),
            ];
            if let Some(sk) = &config.sort_key {
                lines.push(format!("  Sort key: {} (S)", sk.name));
            }
            for gsi in &config.gsis {
                lines.extend(format_gsi(gsi, "  "));
            }
            lines.push("  Billing: PAY_PER_REQUEST".to_string());
            lines
        }
        DeployPlan::AddGsis {
            table_name,
            gsis_to_add,
        } => {
            let mut lines = vec![format!("~ Update table: {table_name}")];
            for gsi in gsis_to_add {
                lines.extend(format_gsi(gsi, "  "));
            }
            lines
        }
        DeployPlan::KeySchemaMismatch {
            table_name,
            found,
            expected,
        } => vec![
            format!("! Table '{table_name}' has an incompatible primary key"),
            format!("  Found:    {}", format_key_schema(found)),
            format!("  Expected: {}", format_key_schema(expected)),
        ],
        DeployPlan::NoChanges { table_name } => {
            vec![format!("= Table '{table_name}' is up to date")]
        }
    }
}

/// Pure function: Format a destroy plan for display.
pub fn format_destroy_plan(plan: &DestroyPlan) -> Vec<String> {
    match plan {
        DestroyPlan::DeleteTable { table_name } => {
            vec![format!(
                "- Delete table: {table_name} (ALL DATA WILL BE LOST)"
            )]
        }
        DestroyPlan::AlreadyGone { table_name } => {
            vec![format!("= Table '{table_name}' does not exist")]
        }
    }
}
