//! Mock payment provider for testing.
//!
//! Provides a configurable mock implementation of `PaymentProvider` for unit
//! and integration tests. Supports:
//! - Pre-configured subscriptions and products
//! - Error injection per method
//! - Call tracking

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::foundation::{CustomerId, SubscriptionId};
use crate::ports::{
    CreateCustomerRequest, Customer, CustomerSession, PaymentError, PaymentProvider,
    PortalSession, Product, Subscription,
};

/// Mock payment provider for testing.
///
/// # Example
///
/// ```ignore
/// let mock = MockPaymentProvider::new();
/// mock.add_subscription(subscription);
/// mock.add_product(product);
/// mock.set_method_error("get_product", PaymentError::network("timeout"));
/// ```
#[derive(Default, Clone)]
pub struct MockPaymentProvider {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    subscriptions: HashMap<String, Subscription>,
    products: HashMap<String, Product>,
    customers: HashMap<String, Customer>,

    /// Customer returned by the next `create_customer` call.
    next_customer: Option<Customer>,

    /// Specific errors by method name.
    method_errors: HashMap<String, PaymentError>,

    call_log: Vec<MethodCall>,
}

/// Recorded method call for assertions.
#[derive(Debug, Clone)]
pub struct MethodCall {
    pub method: String,
    pub args: Vec<String>,
}

impl MockPaymentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Methods
    // ════════════════════════════════════════════════════════════════════════════

    /// Add a subscription to the "provider".
    pub fn add_subscription(&self, subscription: Subscription) {
        let id = subscription.id.as_str().to_string();
        self.state().subscriptions.insert(id, subscription);
    }

    /// Add a product to the "provider".
    pub fn add_product(&self, product: Product) {
        let id = product.id.clone();
        self.state().products.insert(id, product);
    }

    /// Set the customer to return on the next `create_customer` call.
    pub fn set_customer(&self, customer: Customer) {
        self.state().next_customer = Some(customer);
    }

    /// Set an error for a specific method.
    pub fn set_method_error(&self, method: &str, error: PaymentError) {
        self.state()
            .method_errors
            .insert(method.to_string(), error);
    }

    /// Clear all configured errors.
    pub fn clear_errors(&self) {
        self.state().method_errors.clear();
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Call Tracking
    // ════════════════════════════════════════════════════════════════════════════

    /// Get all recorded method calls.
    pub fn calls(&self) -> Vec<MethodCall> {
        self.state().call_log.clone()
    }

    /// Check if a method was called.
    pub fn was_called(&self, method: &str) -> bool {
        self.state().call_log.iter().any(|c| c.method == method)
    }

    /// Get count of calls to a method.
    pub fn call_count(&self, method: &str) -> usize {
        self.state()
            .call_log
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Internal Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record_call(&self, method: &str, args: Vec<String>) -> Result<(), PaymentError> {
        let mut state = self.state();
        state.call_log.push(MethodCall {
            method: method.to_string(),
            args,
        });
        match state.method_errors.get(method) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

fn short_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn get_subscription(
        &self,
        subscription_id: &SubscriptionId,
    ) -> Result<Option<Subscription>, PaymentError> {
        self.record_call("get_subscription", vec![subscription_id.to_string()])?;
        Ok(self.state().subscriptions.get(subscription_id.as_str()).cloned())
    }

    async fn get_product(&self, product_id: &str) -> Result<Option<Product>, PaymentError> {
        self.record_call("get_product", vec![product_id.to_string()])?;
        Ok(self.state().products.get(product_id).cloned())
    }

    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<Customer, PaymentError> {
        self.record_call(
            "create_customer",
            vec![request.user_id.to_string(), request.email.clone()],
        )?;

        let mut state = self.state();
        let customer = match state.next_customer.take() {
            Some(customer) => customer,
            None => Customer {
                id: CustomerId::new(format!("cus_mock_{}", short_id()))
                    .map_err(|e| PaymentError::invalid_response(e.to_string()))?,
                email: Some(request.email),
                name: request.name,
            },
        };
        state
            .customers
            .insert(customer.id.as_str().to_string(), customer.clone());

        Ok(customer)
    }

    async fn create_checkout_session_secret(
        &self,
        customer_id: &CustomerId,
    ) -> Result<CustomerSession, PaymentError> {
        self.record_call("create_checkout_session_secret", vec![customer_id.to_string()])?;

        Ok(CustomerSession {
            client_secret: format!("cuss_secret_mock_{}", short_id()),
            expires_at: chrono::Utc::now().timestamp() + 30 * 60,
        })
    }

    async fn create_billing_portal_url(
        &self,
        customer_id: &CustomerId,
        return_url: &str,
    ) -> Result<PortalSession, PaymentError> {
        self.record_call(
            "create_billing_portal_url",
            vec![customer_id.to_string(), return_url.to_string()],
        )?;

        let id = format!("bps_mock_{}", short_id());
        Ok(PortalSession {
            url: format!("https://billing.stripe.com/p/session/{}", id),
            id,
        })
    }
}
