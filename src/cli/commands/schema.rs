use clap::{Args, ValueEnum};

use crate::api::openapi::ApiVersion;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SchemaFormat {
    Json,
    Yaml,
}

#[derive(Debug, Args)]
pub struct SchemaArgs {
    #[arg(long, default_value = "v1", help = "API version: v1 or v2")]
    pub api: ApiVersion,

    #[arg(long, value_enum, default_value_t = SchemaFormat::Json, help = "Output format")]
    pub format: SchemaFormat,
}

pub fn render(version: ApiVersion, format: SchemaFormat) -> anyhow::Result<String> {
    let document = version.document();
    Ok(match format {
        SchemaFormat::Json => serde_json::to_string_pretty(&document)?,
        SchemaFormat::Yaml => serde_yaml::to_string(&document)?,
    })
}

pub fn handle(args: SchemaArgs) -> anyhow::Result<()> {
    println!("{}", render(args.api, args.format)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_both_formats() {
        let json = render(ApiVersion::V2, SchemaFormat::Json).unwrap();
        assert!(json.contains("/api/v2/accounts/users/"));
        assert!(!json.contains("/api/v1/"));

        let yaml = render(ApiVersion::V1, SchemaFormat::Yaml).unwrap();
        assert!(yaml.contains("HR Management System API"));
    }
}
