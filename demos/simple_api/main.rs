//! Simple example serving two resources declared in YAML
//!
//! Run with `cargo run --example simple_api` from the repository root, then:
//!
//! ```text
//! curl -X POST localhost:3000/writers -H 'content-type: application/json' \
//!      -d '{"name":"Ada","email":"ADA@example.com"}'
//! curl -X POST localhost:3000/comments -H 'content-type: application/json' \
//!      -d '{"body":"hello","writerId":1}'
//! curl 'localhost:3000/comments/1'
//! curl 'localhost:3000/comments?writerId=1&fields=body'
//! ```

use crudgen::prelude::*;
use tracing_subscriber::EnvFilter;

/// Lets callers see a soft-deleted comment with `GET /comments/{id}?deleted=true`
///
/// Only routes addressed by key read the flag. On the list route `deleted`
/// is an equality filter like any other query key.
struct ShowDeleted;

#[async_trait]
impl CustomRequestHook for ShowDeleted {
    async fn override_options(&self, ctx: &RequestContext) -> Result<CustomRequestOptions> {
        if ctx.params.is_empty() {
            return Ok(CustomRequestOptions::default());
        }
        let deleted = ctx
            .query
            .get("deleted")
            .and_then(|value| value.as_str())
            .map(|value| value == "true");
        Ok(CustomRequestOptions {
            soft_deleted: deleted,
            ..Default::default()
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,crudgen=debug")),
        )
        .init();

    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/demos/simple_api/resources.yaml");
    let config = ResourcesConfig::from_yaml_file(path)?;
    println!("✅ Loaded {} resources", config.resources.len());

    let writer = config
        .resource("writer")
        .ok_or_else(|| anyhow::anyhow!("writer resource missing"))?;
    let comment = config
        .resource("comment")
        .ok_or_else(|| anyhow::anyhow!("comment resource missing"))?;

    let writers = InMemoryRepository::new(writer.factory_option());
    let comments = InMemoryRepository::new(comment.factory_option())
        .with_relation("writer", RelationDef::one("writerId", writers.clone(), "id"));

    let builder = ServerBuilder::new()
        .register(writer.prefix(), writer.builder().build()?, writers)
        .register(
            comment.prefix(),
            comment.builder().hook(ShowDeleted).build()?,
            comments,
        );

    println!("\n📚 Generated routes:");
    for (method, path) in builder.route_list() {
        println!("    {:<7} {}", method.as_str(), path);
    }
    println!("\n🌐 Server running on http://127.0.0.1:3000\n");

    builder.serve("127.0.0.1:3000").await
}
