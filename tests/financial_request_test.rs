mod common;

use rust_decimal::Decimal;

use common::*;
use grantflow::errors::AppError;
use grantflow::models::denied_attempt::DenialReason;
use grantflow::models::financial_request::{RequestStage, RequestStatus};
use grantflow::models::workflow_log::{LogAction, Subject};

#[tokio::test]
async fn happy_path_reaches_completed_with_one_log_row_per_stage() {
    let h = harness();
    let wf = &h.workflow;
    let request = submitted_request(wf).await;
    assert_eq!(request.status, RequestStatus::PendingBudget);
    assert!(wf.request_log(request.id).await.unwrap().is_empty());

    h.clock.advance_seconds(60);
    let out = wf.approve_budget(request.id, &budget()).await.unwrap();
    assert_eq!(out.entity.status, RequestStatus::PendingAccounting);
    assert_eq!(out.log.action, LogAction::BudgetApproved);

    h.clock.advance_seconds(60);
    wf.approve_accounting(request.id, &accounting()).await.unwrap();
    h.clock.advance_seconds(60);
    let paid = wf.pay_request(request.id, &cashier()).await.unwrap().entity;

    assert_eq!(paid.status, RequestStatus::Completed);
    let budget_at = paid.budget_approved_at.unwrap();
    let accounting_at = paid.accounting_approved_at.unwrap();
    let paid_at = paid.cashier_paid_at.unwrap();
    assert!(budget_at <= accounting_at && accounting_at <= paid_at);
    assert_eq!(paid.status_changed_at, paid_at);

    let log = wf.request_log(request.id).await.unwrap();
    let actions: Vec<LogAction> = log.iter().map(|e| e.action).collect();
    assert_eq!(
        actions,
        vec![LogAction::BudgetApproved, LogAction::AccountingApproved, LogAction::CashierPaid]
    );
    assert_eq!(log[0].from_status, "pending_budget");
    assert_eq!(log[2].to_status, "completed");
    assert_eq!(log[1].actor_id, Some(accounting().user_id));
    assert!(log.iter().all(|e| e.subject == Subject::request(request.id)));
}

#[tokio::test]
async fn second_budget_approval_conflicts_and_changes_nothing() {
    let h = harness();
    let wf = &h.workflow;
    let request = submitted_request(wf).await;

    let first = wf.approve_budget(request.id, &budget()).await.unwrap().entity;
    h.clock.advance_seconds(30);
    let err = wf.approve_budget(request.id, &budget()).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "got {err:?}");

    let stored = wf.find_request(request.id).await.unwrap();
    assert_eq!(stored, first);
    assert_eq!(wf.request_log(request.id).await.unwrap().len(), 1);

    let denials = wf.recent_denials(&admin(), 10).await.unwrap();
    assert_eq!(denials.len(), 1);
    assert_eq!(denials[0].reason, DenialReason::Conflict);
    assert_eq!(denials[0].action, "budget_approve");
    assert_eq!(denials[0].subject, Some(Subject::request(request.id)));
}

#[tokio::test]
async fn accounting_rejection_keeps_remarks_verbatim() {
    let h = harness();
    let wf = &h.workflow;
    let request = submitted_request(wf).await;
    wf.approve_budget(request.id, &budget()).await.unwrap();

    let out = wf
        .reject_request(request.id, &accounting(), RequestStage::Accounting, Some("insufficient funds"))
        .await
        .unwrap();

    assert_eq!(out.entity.status, RequestStatus::Rejected);
    assert_eq!(out.entity.remarks.as_deref(), Some("insufficient funds"));
    assert_eq!(out.entity.accounting_approved_at, None);
    assert_eq!(out.log.action, LogAction::Rejected);
    assert_eq!(out.log.from_status, "pending_accounting");
    assert_eq!(out.log.remarks.as_deref(), Some("insufficient funds"));
}

#[tokio::test]
async fn rejection_without_remarks_is_a_validation_error() {
    let h = harness();
    let wf = &h.workflow;
    let request = submitted_request(wf).await;

    for remarks in [None, Some(""), Some("   \n\t")] {
        let err = wf
            .reject_request(request.id, &budget(), RequestStage::Budget, remarks)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)), "got {err:?}");
    }

    let stored = wf.find_request(request.id).await.unwrap();
    assert_eq!(stored, request);
    assert!(wf.request_log(request.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn wrong_role_is_refused_and_recorded_as_denial() {
    let h = harness();
    let wf = &h.workflow;
    let request = submitted_request(wf).await;

    let err = wf.approve_budget(request.id, &staff()).await.unwrap_err();
    assert!(matches!(err, AppError::PermissionDenied(_)), "got {err:?}");
    let err = wf.pay_request(request.id, &budget()).await.unwrap_err();
    assert!(matches!(err, AppError::PermissionDenied(_)), "got {err:?}");

    assert_eq!(wf.find_request(request.id).await.unwrap(), request);
    assert!(wf.request_log(request.id).await.unwrap().is_empty());

    let denials = wf.recent_denials(&admin(), 10).await.unwrap();
    assert_eq!(denials.len(), 2);
    assert!(denials.iter().all(|d| d.reason == DenialReason::Forbidden));
    assert_eq!(denials[0].actor_id, budget().user_id);
}

#[tokio::test]
async fn reject_only_applies_at_the_named_stage() {
    let h = harness();
    let wf = &h.workflow;
    let request = submitted_request(wf).await;
    wf.approve_budget(request.id, &budget()).await.unwrap();

    let err = wf
        .reject_request(request.id, &budget(), RequestStage::Budget, Some("late"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "got {err:?}");
    assert_eq!(
        wf.find_request(request.id).await.unwrap().status,
        RequestStatus::PendingAccounting
    );
}

#[tokio::test]
async fn terminal_requests_accept_no_further_transitions() {
    let h = harness();
    let wf = &h.workflow;
    let request = submitted_request(wf).await;
    wf.reject_request(request.id, &budget(), RequestStage::Budget, Some("duplicate"))
        .await
        .unwrap();

    let err = wf.approve_budget(request.id, &budget()).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    let err = wf
        .reject_request(request.id, &budget(), RequestStage::Budget, Some("again"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(wf.request_log(request.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn skip_to_cashier_marks_accounting_as_bypassed() {
    let h = harness();
    let wf = &h.workflow;
    let request = submitted_request(wf).await;

    let err = wf
        .skip_to_cashier(request.id, &budget(), Some("urgent"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::PermissionDenied(_)));
    let err = wf.skip_to_cashier(request.id, &admin(), None).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let out = wf
        .skip_to_cashier(request.id, &admin(), Some("Typhoon relief, pre-approved"))
        .await
        .unwrap();
    let skipped = out.entity;
    assert_eq!(skipped.status, RequestStatus::PendingCashier);
    assert!(skipped.accounting_bypassed);
    assert!(skipped.budget_approved_at.is_some());
    assert_eq!(skipped.accounting_approved_at, None);
    assert_eq!(skipped.remarks, None);
    assert_eq!(out.log.action, LogAction::SkippedAccounting);
    assert_eq!(out.log.remarks.as_deref(), Some("Typhoon relief, pre-approved"));

    let paid = wf.pay_request(request.id, &cashier()).await.unwrap().entity;
    assert_eq!(paid.status, RequestStatus::Completed);
}

#[tokio::test]
async fn stage_timestamps_never_go_backwards() {
    let h = harness();
    let wf = &h.workflow;
    let request = submitted_request(wf).await;

    h.clock.advance_seconds(3_600);
    let approved = wf.approve_budget(request.id, &budget()).await.unwrap().entity;

    // Wall clock steps back an hour and a half.
    h.clock.advance_seconds(-5_400);
    let next = wf.approve_accounting(request.id, &accounting()).await.unwrap().entity;

    assert!(next.accounting_approved_at.unwrap() >= approved.budget_approved_at.unwrap());
    assert!(next.status_changed_at >= approved.status_changed_at);
}

#[tokio::test]
async fn submission_validates_title_and_amount() {
    let h = harness();
    let wf = &h.workflow;

    let cases = [
        request_form("", pesos(100)),
        request_form("   ", pesos(100)),
        request_form(&"x".repeat(256), pesos(100)),
        request_form("Fare", pesos(0)),
        request_form("Fare", pesos(-500)),
        // Sub-centavo and oversize amounts do not fit NUMERIC(14, 2).
        request_form("Fare", Decimal::new(1, 3)),
        request_form("Fare", Decimal::new(1_005, 3)),
        request_form("Fare", Decimal::new(1_000_000_000_000_000, 0)),
    ];
    for form in cases {
        let err = wf.submit_request(&staff(), form).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)), "got {err:?}");
    }
    assert!(wf.list_requests(&Default::default()).await.unwrap().is_empty());

    let ok = wf
        .submit_request(&staff(), request_form(&"x".repeat(255), pesos(1)))
        .await
        .unwrap();
    assert_eq!(ok.user_id, staff().user_id);
    assert_eq!(ok.created_at, start_time());
}

#[tokio::test]
async fn missing_request_is_not_found() {
    let h = harness();
    let err = h.workflow.approve_budget(404, &budget()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "got {err:?}");
    let err = h.workflow.request_log(404).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn concurrent_budget_approvals_let_exactly_one_through() {
    let (h, store) = racing_harness();
    let wf = &h.workflow;
    let request = submitted_request(wf).await;
    let (first_officer, second_officer) = (budget(), budget_deputy());

    let (a, b) = tokio::join!(
        wf.approve_budget(request.id, &first_officer),
        wf.approve_budget(request.id, &second_officer),
    );

    // Both calls passed the status check and reached the conditional save.
    assert_eq!(store.save_attempts(), 2);
    let results = [a, b];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    let loser = results.iter().find_map(|r| r.as_ref().err()).unwrap();
    assert!(matches!(loser, AppError::Conflict(_)), "got {loser:?}");

    let stored = wf.find_request(request.id).await.unwrap();
    assert_eq!(stored.status, RequestStatus::PendingAccounting);
    assert_eq!(wf.request_log(request.id).await.unwrap().len(), 1);

    let denials = wf.recent_denials(&admin(), 10).await.unwrap();
    assert_eq!(denials.len(), 1);
    assert_eq!(denials[0].reason, DenialReason::Conflict);
}
