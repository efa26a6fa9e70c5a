use crate::{
    auth::{context::AuthContext, password::PasswordHasher},
    db::IdentityResolver,
    models::{Identity, PasswordChangeRequest, Principal, UpdateProfileRequest, UserProfile},
    utils::{ApiError, ApiResult, AuthError},
};
use std::sync::Arc;

/// Profile reads and self-service changes for the authenticated principal
pub struct ProfileService {
    resolver: Arc<dyn IdentityResolver>,
    hasher: Arc<dyn PasswordHasher>,
}

impl ProfileService {
    pub fn new(resolver: Arc<dyn IdentityResolver>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { resolver, hasher }
    }

    async fn load(&self, principal: &Principal) -> ApiResult<Identity> {
        self.resolver
            .find_by_email(&principal.email)
            .await?
            .ok_or_else(|| AuthError::NotFound.into())
    }

    pub async fn get_profile(&self, principal: &Principal) -> ApiResult<UserProfile> {
        Ok(self.load(principal).await?.into())
    }

    pub async fn update_profile(
        &self,
        principal: &Principal,
        request: UpdateProfileRequest,
    ) -> ApiResult<UserProfile> {
        request.validate()?;

        let mut identity = self.load(principal).await?;
        request.apply(&mut identity);
        let updated = self.resolver.update(identity).await?;
        tracing::info!(user_id = %updated.id, "Profile updated");
        Ok(updated.into())
    }

    /// Check the current password, then store a fresh digest of the new one
    pub async fn change_password(
        &self,
        principal: &Principal,
        request: &PasswordChangeRequest,
    ) -> ApiResult<()> {
        request.validate()?;

        let mut identity = self.load(principal).await?;
        if !self
            .hasher
            .matches(&request.current_password, &identity.password_hash)
        {
            return Err(ApiError::validation_error("Current password is incorrect"));
        }
        if request.new_password != request.confirm_password {
            return Err(ApiError::validation_error(
                "New password and confirm password do not match",
            ));
        }

        identity.password_hash = self.hasher.hash(&request.new_password)?;
        let updated = self.resolver.update(identity).await?;
        tracing::info!(user_id = %updated.id, "Password changed");
        Ok(())
    }

    /// Remove the account and drop the principal from this request
    pub async fn delete_account(&self, principal: &Principal, ctx: &AuthContext) -> ApiResult<()> {
        if !self.resolver.delete_by_email(&principal.email).await? {
            return Err(AuthError::NotFound.into());
        }
        ctx.clear();
        tracing::info!(user_id = %principal.id, "Account deleted");
        Ok(())
    }
}
