use crate::actuals::ActualMetrics;
use crate::cli::{SchemaArgs, SchemaTarget};
use crate::config::Config;
use crate::model::Scenario;
use schemars::schema_for;

pub fn execute(args: SchemaArgs) -> anyhow::Result<()> {
    let schema = match args.target {
        SchemaTarget::Config => schema_for!(Config),
        SchemaTarget::Scenario => schema_for!(Scenario),
        SchemaTarget::Actuals => schema_for!(ActualMetrics),
    };
    let json = serde_json::to_string_pretty(&schema)?;
    println!("{}", json);
    Ok(())
}
