use crate::application::reconciler::TransactionReconciler;
use crate::config::EppConfig;
use crate::domain::ports::TransactionStoreBox;
use crate::domain::sale::{AckStatus, Acknowledgment, CallbackPayload, SaleRequest};
use crate::error::{PaymentError, Result};
use crate::interfaces::checkout_form::CheckoutFormBuilder;
use tracing::{debug, error, info, warn};

/// The entry point for payment processing.
///
/// `PaymentOrchestrator` validates requests, applies derived defaults,
/// reconciles transaction records around the hosted-checkout round trip, and
/// maps results to the caller-facing shapes. It owns the store (through the
/// reconciler) and the form builder; configuration is passed in at
/// construction time.
pub struct PaymentOrchestrator {
    config: EppConfig,
    reconciler: TransactionReconciler,
    form_builder: CheckoutFormBuilder,
}

impl PaymentOrchestrator {
    pub fn new(config: EppConfig, store: TransactionStoreBox) -> Self {
        Self {
            config,
            reconciler: TransactionReconciler::new(store),
            form_builder: CheckoutFormBuilder::new(),
        }
    }

    /// Initiates a payment: validates the sale request, applies defaults,
    /// records the initiation, and returns the hosted-checkout form HTML.
    ///
    /// Recording the initiation is best-effort by default: a store failure
    /// only degrades auditability and must not block the checkout redirect.
    /// `require_initiation_record` in the config makes it fatal instead.
    pub async fn initiate(&self, mut sale: SaleRequest) -> Result<String> {
        info!(order_key = %sale.order_key, "initiating payment");

        self.ensure_enabled()?;
        sale.validate()?;
        sale.apply_defaults(&self.config.application_code);

        let amount = sale.total_amount.ok_or_else(|| {
            PaymentError::Validation("total amount must be greater than zero".into())
        })?;
        let raw_request = serde_json::to_string(&sale)?;

        match self
            .reconciler
            .record_initiation(
                &sale.order_key,
                sale.application_unique_id.as_deref(),
                amount,
                Some(&sale.email),
                &raw_request,
            )
            .await
        {
            Ok(tx) => debug!(order_key = %tx.order_key, "initiation record stored"),
            Err(err) if self.config.require_initiation_record => {
                error!(order_key = %sale.order_key, %err, "failed to record initiation");
                return Err(PaymentError::processing(
                    "PAYMENT_INITIATION_FAILED",
                    format!("failed to record initiation for order {}: {err}", sale.order_key),
                ));
            }
            Err(err) => {
                warn!(order_key = %sale.order_key, %err, "failed to record initiation, continuing");
            }
        }

        let html = self.form_builder.build(&sale, &self.config.checkout_url)?;
        info!(order_key = %sale.order_key, "payment initiated");
        Ok(html)
    }

    /// Processes a processor callback: validates it, reconciles the stored
    /// transaction, and maps the post-write row to an acknowledgment.
    ///
    /// Callers facing the processor should go through [`Self::acknowledge`],
    /// which additionally applies the boundary status policy and never fails.
    pub async fn process_callback(&self, callback: &CallbackPayload) -> Result<Acknowledgment> {
        info!(order_key = %callback.order_key, status = %callback.status, "processing callback");

        self.ensure_enabled()?;
        let status = callback.validate()?;
        let raw_response = serde_json::to_string(callback)?;

        let tx = self
            .reconciler
            .record_callback(
                &callback.order_key,
                callback.application_unique_id.as_deref(),
                status,
                &raw_response,
                callback.auth_code.as_deref(),
                callback.reference_no.as_deref(),
            )
            .await?;

        let mut ack = Acknowledgment::from_transaction(&tx);
        ack.message = Some("Payment callback processed successfully".into());

        info!(order_key = %callback.order_key, "callback processed");
        Ok(ack)
    }

    /// Produces the acknowledgment the processor must always receive.
    ///
    /// Two pieces of the external protocol live here: a cancelled payment is
    /// acknowledged with status `COM` (the processor expects `COM` even for
    /// cancellations), and any internal failure still yields a syntactically
    /// valid acknowledgment with status `CAN` for an inbound cancellation and
    /// `RET` otherwise, carrying the diagnostic in `errorMessage`.
    pub async fn acknowledge(&self, callback: CallbackPayload) -> Acknowledgment {
        let cancelled = callback.is_cancellation();

        match self.process_callback(&callback).await {
            Ok(mut ack) => {
                if cancelled {
                    ack.status = AckStatus::Com;
                }
                ack
            }
            Err(err) => {
                error!(order_key = %callback.order_key, %err, "callback processing failed");
                Acknowledgment {
                    order_key: callback.order_key,
                    application_unique_id: callback.application_unique_id,
                    status: if cancelled { AckStatus::Can } else { AckStatus::Ret },
                    error_message: Some(format!("[{}] {err}", err.code())),
                    header_message: None,
                    html_markup: None,
                    message: None,
                }
            }
        }
    }

    fn ensure_enabled(&self) -> Result<()> {
        if !self.config.enabled {
            return Err(PaymentError::Disabled);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{TransactionStore, TransactionUpsert};
    use crate::domain::sale::SaleItem;
    use crate::domain::transaction::{Status, Transaction};
    use crate::infrastructure::in_memory::InMemoryTransactionStore;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    struct BrokenStore;

    #[async_trait]
    impl TransactionStore for BrokenStore {
        async fn find(
            &self,
            _order_key: &str,
            _application_unique_id: Option<&str>,
        ) -> Result<Option<Transaction>> {
            Err(PaymentError::Store("database unavailable".into()))
        }

        async fn upsert(&self, _upsert: TransactionUpsert) -> Result<Transaction> {
            Err(PaymentError::Store("database unavailable".into()))
        }
    }

    fn config() -> EppConfig {
        EppConfig {
            enabled: true,
            application_code: "RUC-APP".into(),
            checkout_url: "https://epp.example.com/Payment/Index".into(),
            require_initiation_record: false,
        }
    }

    fn sale(order_key: &str, amount: Decimal) -> SaleRequest {
        SaleRequest {
            order_key: order_key.into(),
            first_name: "John".into(),
            last_name: "Doe".into(),
            address1: "123 Main St".into(),
            city: "Harrisburg".into(),
            state_code: "PA".into(),
            zip_code: "17101".into(),
            total_amount: Some(amount),
            email: "a@b.com".into(),
            items: vec![SaleItem {
                count: 1,
                description: "Test Item".into(),
                amount,
                ..SaleItem::default()
            }],
            ..SaleRequest::default()
        }
    }

    fn callback(order_key: &str, status: &str) -> CallbackPayload {
        CallbackPayload {
            order_key: order_key.into(),
            status: status.into(),
            ..CallbackPayload::default()
        }
    }

    fn orchestrator() -> (PaymentOrchestrator, InMemoryTransactionStore) {
        let store = InMemoryTransactionStore::new();
        (
            PaymentOrchestrator::new(config(), Box::new(store.clone())),
            store,
        )
    }

    #[tokio::test]
    async fn test_initiate_builds_form_and_records_transaction() {
        let (orchestrator, store) = orchestrator();

        let html = orchestrator.initiate(sale("ORD1", dec!(10.00))).await.unwrap();
        assert_eq!(html.matches("<form").count(), 1);
        assert!(html.contains("action='https://epp.example.com/Payment/Index'"));
        // Defaults landed in the serialized payload.
        assert!(html.contains(r#"\"ApplicationCode\":\"RUC-APP\""#));
        assert!(html.contains(r#"\"ItemKey\":\"ORD1\""#));

        let tx = store.find("ORD1", None).await.unwrap().unwrap();
        assert_eq!(tx.status, Status::App);
        assert_eq!(tx.amount, Some(dec!(10.00)));
        assert_eq!(tx.email, Some("a@b.com".to_string()));
        assert!(tx.raw_request.is_some());
        assert!(tx.raw_response.is_none());
    }

    #[tokio::test]
    async fn test_initiate_rejects_invalid_requests() {
        let (orchestrator, _store) = orchestrator();

        let mut blank = sale("ORD1", dec!(10.00));
        blank.order_key = " ".into();
        assert!(matches!(
            orchestrator.initiate(blank).await,
            Err(PaymentError::Validation(_))
        ));

        assert!(matches!(
            orchestrator.initiate(sale("ORD1", dec!(0.00))).await,
            Err(PaymentError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_initiate_rejects_when_disabled() {
        let store = InMemoryTransactionStore::new();
        let orchestrator = PaymentOrchestrator::new(
            EppConfig {
                enabled: false,
                ..config()
            },
            Box::new(store),
        );

        assert!(matches!(
            orchestrator.initiate(sale("ORD1", dec!(10.00))).await,
            Err(PaymentError::Disabled)
        ));
    }

    #[tokio::test]
    async fn test_initiate_survives_store_failure() {
        let orchestrator = PaymentOrchestrator::new(config(), Box::new(BrokenStore));

        let html = orchestrator.initiate(sale("ORD1", dec!(10.00))).await.unwrap();
        assert!(html.contains("saleDetail"));
    }

    #[tokio::test]
    async fn test_initiate_store_failure_fatal_when_required() {
        let orchestrator = PaymentOrchestrator::new(
            EppConfig {
                require_initiation_record: true,
                ..config()
            },
            Box::new(BrokenStore),
        );

        let err = orchestrator
            .initiate(sale("ORD1", dec!(10.00)))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "PAYMENT_INITIATION_FAILED");
    }

    #[tokio::test]
    async fn test_callback_reconciles_completed_payment() {
        let (orchestrator, store) = orchestrator();
        orchestrator.initiate(sale("ORD1", dec!(10.00))).await.unwrap();

        let mut payload = callback("ORD1", "COM");
        payload.auth_code = Some("AUTH9".into());
        let ack = orchestrator.acknowledge(payload).await;

        assert_eq!(ack.order_key, "ORD1");
        assert_eq!(ack.status, AckStatus::Com);
        assert!(ack.error_message.is_none());

        let tx = store.find("ORD1", None).await.unwrap().unwrap();
        assert_eq!(tx.status, Status::Com);
        assert_eq!(tx.amount, Some(dec!(10.00)));
        assert_eq!(tx.email, Some("a@b.com".to_string()));
        assert_eq!(tx.auth_code, Some("AUTH9".to_string()));
    }

    #[tokio::test]
    async fn test_callback_without_prior_initiation_succeeds() {
        let (orchestrator, store) = orchestrator();

        let ack = orchestrator.acknowledge(callback("UNSEEN", "COM")).await;
        assert_eq!(ack.status, AckStatus::Com);
        assert!(ack.error_message.is_none());

        let tx = store.find("UNSEEN", None).await.unwrap().unwrap();
        assert_eq!(tx.amount, None);
        assert_eq!(tx.email, None);
    }

    #[tokio::test]
    async fn test_cancellation_stored_as_can_acknowledged_as_com() {
        let (orchestrator, store) = orchestrator();
        orchestrator.initiate(sale("ORD1", dec!(10.00))).await.unwrap();

        let ack = orchestrator.acknowledge(callback("ORD1", "CAN")).await;
        assert_eq!(ack.status, AckStatus::Com);

        let tx = store.find("ORD1", None).await.unwrap().unwrap();
        assert_eq!(tx.status, Status::Can);
    }

    #[tokio::test]
    async fn test_store_failure_yields_retry_acknowledgment() {
        let orchestrator = PaymentOrchestrator::new(config(), Box::new(BrokenStore));

        let ack = orchestrator.acknowledge(callback("ORD1", "COM")).await;
        assert_eq!(ack.status, AckStatus::Ret);
        assert!(!ack.error_message.clone().unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_on_cancellation_acknowledges_can() {
        let orchestrator = PaymentOrchestrator::new(config(), Box::new(BrokenStore));

        let ack = orchestrator.acknowledge(callback("ORD1", "CAN")).await;
        assert_eq!(ack.status, AckStatus::Can);
        assert!(ack.error_message.is_some());
    }

    #[tokio::test]
    async fn test_invalid_callback_still_acknowledged() {
        let (orchestrator, _store) = orchestrator();

        let ack = orchestrator.acknowledge(callback("ORD1", "BOGUS")).await;
        assert_eq!(ack.status, AckStatus::Ret);
        assert!(ack.error_message.unwrap().contains("VALIDATION"));

        let ack = orchestrator.acknowledge(callback("", "COM")).await;
        assert_eq!(ack.status, AckStatus::Ret);
    }

    #[tokio::test]
    async fn test_process_callback_passes_non_terminal_status_through() {
        let (orchestrator, _store) = orchestrator();

        let ack = orchestrator.acknowledge(callback("ORD1", "DEC")).await;
        assert_eq!(ack.status, AckStatus::Dec);
        assert_eq!(ack.message.as_deref(), Some("Payment callback processed successfully"));
    }
}
