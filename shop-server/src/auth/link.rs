//! Magic-link issuing and redemption
//!
//! A link code is single use. It stays redeemable while its whole-day age is
//! at most [`AUTH_LINK_TTL_DAYS`]; expired codes are simply never matched.

use async_trait::async_trait;
use shared::error::{AppError, ErrorCode};

use crate::email::Mailer;
use crate::error::ServiceResult;
use crate::period::DAY_MS;
use crate::util::generate_auth_code;

/// Largest whole-day age a link may have and still be redeemed
pub const AUTH_LINK_TTL_DAYS: i64 = 7;

/// Persistence seam for auth links
#[async_trait]
pub trait AuthLinkStore: Send + Sync {
    async fn find_user_id_by_email(&self, email: &str) -> ServiceResult<Option<String>>;

    async fn insert_link(&self, code: &str, user_id: &str, created_at: i64) -> ServiceResult<()>;

    /// Delete the link iff `created_at > cutoff` and return its user, as one
    /// atomic statement
    async fn consume_link(&self, code: &str, cutoff: i64) -> ServiceResult<Option<String>>;

    async fn managed_restaurant_id(&self, user_id: &str) -> ServiceResult<Option<String>>;
}

/// A successfully consumed link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedeemedLink {
    pub user_id: String,
    pub restaurant_id: Option<String>,
}

/// Whole-day age (truncated) above the TTL
#[cfg(test)]
pub fn is_link_expired(created_at: i64, now: i64) -> bool {
    (now - created_at) / DAY_MS > AUTH_LINK_TTL_DAYS
}

/// Oldest `created_at` (exclusive) that is still redeemable at `now`.
///
/// `created_at > cutoff` holds exactly when `!is_link_expired(created_at, now)`.
pub fn redemption_cutoff(now: i64) -> i64 {
    now - (AUTH_LINK_TTL_DAYS + 1) * DAY_MS
}

/// Redemption URL: `{api_base}/auth-links/authenticate?code=…&redirect=…`
pub fn build_link_url(
    api_base_url: &str,
    code: &str,
    redirect: &str,
) -> Result<url::Url, url::ParseError> {
    let mut url = url::Url::parse(&format!(
        "{}/auth-links/authenticate",
        api_base_url.trim_end_matches('/')
    ))?;
    url.query_pairs_mut()
        .append_pair("code", code)
        .append_pair("redirect", redirect);
    Ok(url)
}

/// Resolve the post-login redirect; only targets under `allowed_prefix` pass
///
/// The target must share the prefix's origin (scheme, host, port), sit at or
/// below its path, and be usable as a `Location` header as given.
pub fn validate_redirect(redirect: Option<&str>, allowed_prefix: &str) -> Result<String, AppError> {
    let Some(r) = redirect.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(allowed_prefix.to_string());
    };
    if redirect_allowed(r, allowed_prefix) {
        Ok(r.to_string())
    } else {
        Err(AppError::invalid_field(
            "redirect",
            "Redirect target is not allowed",
        ))
    }
}

fn redirect_allowed(target: &str, allowed_prefix: &str) -> bool {
    if http::HeaderValue::from_str(target).is_err() || !target.starts_with(allowed_prefix) {
        return false;
    }
    let (Ok(target), Ok(allowed)) = (url::Url::parse(target), url::Url::parse(allowed_prefix))
    else {
        return false;
    };
    if target.origin() != allowed.origin() {
        return false;
    }
    let base = allowed.path().trim_end_matches('/');
    let path = target.path();
    base.is_empty() || path == base || path.starts_with(&format!("{base}/"))
}

/// Issue a link for `email` and mail it.
///
/// Unknown emails and mail failures end the same way as a sent link so the
/// caller cannot probe which addresses have accounts.
pub async fn issue_link<S, M>(
    store: &S,
    mailer: &M,
    email: &str,
    api_base_url: &str,
    redirect: &str,
    now: i64,
) -> ServiceResult<()>
where
    S: AuthLinkStore + ?Sized,
    M: Mailer + ?Sized,
{
    let Some(user_id) = store.find_user_id_by_email(email).await? else {
        tracing::debug!("Auth link requested for unknown email");
        return Ok(());
    };

    let code = generate_auth_code();
    store.insert_link(&code, &user_id, now).await?;

    let link = build_link_url(api_base_url, &code, redirect).map_err(|e| {
        AppError::with_message(ErrorCode::ConfigError, format!("Invalid API_BASE_URL: {e}"))
    })?;

    if let Err(e) = mailer.send_auth_link(email, link.as_str()).await {
        tracing::warn!(user_id = %user_id, error = %e, "Failed to deliver auth link");
    }
    Ok(())
}

/// Consume `code` and resolve the session scope of its user
pub async fn redeem_link<S: AuthLinkStore + ?Sized>(
    store: &S,
    code: &str,
    now: i64,
) -> ServiceResult<RedeemedLink> {
    let code = code.trim();
    if code.is_empty() {
        return Err(AppError::new(ErrorCode::InvalidAuthLink).into());
    }

    let user_id = store
        .consume_link(code, redemption_cutoff(now))
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::InvalidAuthLink))?;

    let restaurant_id = store.managed_restaurant_id(&user_id).await?;
    tracing::info!(user_id = %user_id, "Auth link redeemed");

    Ok(RedeemedLink {
        user_id,
        restaurant_id,
    })
}
