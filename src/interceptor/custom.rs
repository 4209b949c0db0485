//! Per-request override hook

use crate::core::error::CrudError;
use crate::core::options::CustomRequestOptions;
use crate::core::request::RequestContext;
use async_trait::async_trait;

/// Produces per-request overrides before the operation interceptor runs
///
/// A failure is propagated unchanged and aborts the request before any
/// repository call.
///
/// # Example
///
/// ```rust,ignore
/// struct IncludeDeleted;
///
/// #[async_trait]
/// impl CustomRequestHook for IncludeDeleted {
///     async fn override_options(&self, _ctx: &RequestContext) -> anyhow::Result<CustomRequestOptions> {
///         Ok(CustomRequestOptions { soft_deleted: Some(true), ..Default::default() })
///     }
/// }
/// ```
#[async_trait]
pub trait CustomRequestHook: Send + Sync {
    async fn override_options(&self, ctx: &RequestContext) -> anyhow::Result<CustomRequestOptions>;
}

/// Run the hook, if any, and store its overrides in the request context
///
/// Without a hook the stored overrides are empty, so the interceptor always
/// finds a value.
pub async fn apply_custom_options(
    hook: Option<&dyn CustomRequestHook>,
    ctx: &mut RequestContext,
) -> Result<(), CrudError> {
    let options = match hook {
        Some(hook) => hook
            .override_options(ctx)
            .await
            .map_err(CrudError::Hook)?,
        None => CustomRequestOptions::default(),
    };
    ctx.set_custom_options(options);
    Ok(())
}
