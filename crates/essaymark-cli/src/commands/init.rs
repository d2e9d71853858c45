//! The `essaymark init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("essaymark.toml").exists() {
        println!("essaymark.toml already exists, skipping.");
    } else {
        std::fs::write("essaymark.toml", SAMPLE_CONFIG)?;
        println!("Created essaymark.toml");
    }

    println!("\nNext steps:");
    println!("  1. Export UUID, AUTH_KEY and AUTH_SECRET for your scoring agent");
    println!("  2. Run: essaymark evaluate --essay my-essay.txt");
    println!("  3. Run: essaymark serve");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# essaymark configuration

[agent]
agent_id = "${UUID}"
auth_key = "${AUTH_KEY}"
auth_secret = "${AUTH_SECRET}"
# uat | test | lingda
platform = "uat"
# base_url = "https://uat.agentspro.cn"
timeout_secs = 30

[server]
bind = "127.0.0.1:3000"
max_words = 500

[store]
# Omit to disable review persistence.
path = "essaymark.db"
"#;
