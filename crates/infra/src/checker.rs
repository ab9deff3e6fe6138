//! AI compliance checker, gated to signed-in members.

use tracing::debug;

use gpsrhub_ai::{CheckResult, ComplianceCheckRequest, ComplianceChecker};
use gpsrhub_auth::{CurrentUser, Permission, authorize, require_user};

use crate::error::WizardError;

pub struct CheckerDesk<'a, C: ?Sized> {
    checker: &'a C,
}

impl<'a, C> CheckerDesk<'a, C>
where
    C: ComplianceChecker + ?Sized,
{
    pub fn new(checker: &'a C) -> Self {
        Self { checker }
    }

    /// One question, one answer. The answer is advice only and never stored.
    pub async fn ask(
        &self,
        user: Option<&CurrentUser>,
        request: &ComplianceCheckRequest,
    ) -> Result<CheckResult, WizardError> {
        let user = require_user(user)?;
        authorize(user, &Permission::CHECKER_USE)?;
        let result = self.checker.check(request).await?;
        debug!(user_id = %user.id, answer_len = result.content.len(), "compliance check answered");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use gpsrhub_ai::{AiError, Block};
    use gpsrhub_auth::AuthzError;
    use gpsrhub_core::UserId;

    #[derive(Default)]
    struct CannedChecker {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ComplianceChecker for CannedChecker {
        async fn check(&self, request: &ComplianceCheckRequest) -> Result<CheckResult, AiError> {
            request.validate(1024)?;
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(CheckResult::new("## Verdict\n\n- Add a **CE** mark\n"))
        }
    }

    #[tokio::test]
    async fn members_get_a_renderable_answer() {
        let checker = CannedChecker::default();
        let desk = CheckerDesk::new(&checker);
        let user = CurrentUser::member(UserId::new(), "maker@example.com");

        let result = desk
            .ask(Some(&user), &ComplianceCheckRequest::new("Is my toy GPSR compliant?"))
            .await
            .unwrap();
        let blocks = result.blocks();
        assert!(matches!(blocks[0], Block::Heading { level: 2, .. }));
        assert!(matches!(blocks[1], Block::List { .. }));
    }

    #[tokio::test]
    async fn admins_and_blank_prompts_never_reach_the_checker() {
        let checker = CannedChecker::default();
        let desk = CheckerDesk::new(&checker);

        let admin = CurrentUser::admin(UserId::new(), "reviewer@example.com");
        let err = desk
            .ask(Some(&admin), &ComplianceCheckRequest::new("hello"))
            .await
            .unwrap_err();
        assert!(matches!(err, WizardError::Authz(AuthzError::Forbidden(_))));
        assert_eq!(checker.calls.load(Ordering::SeqCst), 0);

        let user = CurrentUser::member(UserId::new(), "maker@example.com");
        let err = desk
            .ask(Some(&user), &ComplianceCheckRequest::new("  "))
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Please check your question and image and try again.");
    }
}
