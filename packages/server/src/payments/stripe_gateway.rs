use std::collections::HashMap;
use std::str::FromStr;

use common::{SubscriptionStatus, SubscriptionTier};
use stripe::{EventObject, EventType, Expandable, Webhook};

use super::{
    CheckoutSession, PaymentError, PaymentEvent, PaymentGateway, PointsCheckout,
    SubscriptionCheckout, WebhookEvent,
};
use crate::config::{PaymentsConfig, SubscriptionPrices};

pub struct StripeGateway {
    client: stripe::Client,
    webhook_secret: String,
    currency: stripe::Currency,
    prices: SubscriptionPrices,
}

fn provider(err: impl std::fmt::Display) -> PaymentError {
    PaymentError::Provider(err.to_string())
}

fn parse_currency(code: &str) -> Result<stripe::Currency, PaymentError> {
    match code.to_ascii_lowercase().as_str() {
        "usd" => Ok(stripe::Currency::USD),
        "eur" => Ok(stripe::Currency::EUR),
        "gbp" => Ok(stripe::Currency::GBP),
        "cad" => Ok(stripe::Currency::CAD),
        "aud" => Ok(stripe::Currency::AUD),
        other => Err(PaymentError::NotConfigured(format!("Currency '{other}'"))),
    }
}

fn customer_id(customer: &Expandable<stripe::Customer>) -> String {
    match customer {
        Expandable::Id(id) => id.to_string(),
        Expandable::Object(c) => c.id.to_string(),
    }
}

impl StripeGateway {
    pub fn new(config: &PaymentsConfig) -> Result<Self, PaymentError> {
        let secret_key = config
            .secret_key
            .as_deref()
            .ok_or_else(|| PaymentError::NotConfigured("payments.secret_key".into()))?;
        let webhook_secret = config
            .webhook_secret
            .clone()
            .ok_or_else(|| PaymentError::NotConfigured("payments.webhook_secret".into()))?;

        Ok(Self {
            client: stripe::Client::new(secret_key),
            webhook_secret,
            currency: parse_currency(&config.currency)?,
            prices: config.subscription_prices.clone(),
        })
    }

    fn price_for(&self, tier: SubscriptionTier) -> Option<&str> {
        match tier {
            SubscriptionTier::Free => None,
            SubscriptionTier::Creator => self.prices.creator.as_deref(),
            SubscriptionTier::Pro => self.prices.pro.as_deref(),
        }
    }

    fn tier_for(&self, subscription: &stripe::Subscription) -> Option<SubscriptionTier> {
        subscription
            .items
            .data
            .iter()
            .filter_map(|item| item.price.as_ref())
            .find_map(|price| {
                let id = price.id.as_str();
                if self.prices.pro.as_deref() == Some(id) {
                    Some(SubscriptionTier::Pro)
                } else if self.prices.creator.as_deref() == Some(id) {
                    Some(SubscriptionTier::Creator)
                } else {
                    None
                }
            })
    }

    fn decode_checkout(&self, session: &stripe::CheckoutSession) -> PaymentEvent {
        let metadata = session.metadata.clone().unwrap_or_default();
        let user_id = session
            .client_reference_id
            .as_deref()
            .and_then(|id| id.parse::<i32>().ok());
        let Some(user_id) = user_id else {
            tracing::warn!(session_id = %session.id, "Checkout without a user reference");
            return PaymentEvent::Ignored;
        };

        match metadata.get("kind").map(String::as_str) {
            Some("points") => {
                let points = metadata.get("points").and_then(|p| p.parse::<i64>().ok());
                match (metadata.get("package_id"), points) {
                    (Some(package_id), Some(points)) => PaymentEvent::PointsPurchased {
                        user_id,
                        package_id: package_id.clone(),
                        points,
                        session_id: session.id.to_string(),
                    },
                    _ => {
                        tracing::warn!(session_id = %session.id, "Points checkout with incomplete metadata");
                        PaymentEvent::Ignored
                    }
                }
            }
            Some("subscription") => match (&session.customer, &session.subscription) {
                (Some(customer), Some(subscription)) => PaymentEvent::SubscriptionStarted {
                    user_id,
                    customer_id: customer_id(customer),
                    subscription_id: match subscription {
                        Expandable::Id(id) => id.to_string(),
                        Expandable::Object(s) => s.id.to_string(),
                    },
                },
                _ => PaymentEvent::Ignored,
            },
            _ => PaymentEvent::Ignored,
        }
    }

    fn decode_subscription(&self, subscription: &stripe::Subscription) -> PaymentEvent {
        PaymentEvent::SubscriptionChanged {
            customer_id: customer_id(&subscription.customer),
            subscription_id: subscription.id.to_string(),
            status: SubscriptionStatus::from_processor(subscription.status.as_str()),
            tier: self.tier_for(subscription),
        }
    }
}

#[async_trait::async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_customer(
        &self,
        user_id: i32,
        email: &str,
        name: &str,
    ) -> Result<String, PaymentError> {
        let mut metadata = HashMap::new();
        metadata.insert("user_id".to_string(), user_id.to_string());

        let customer = stripe::Customer::create(
            &self.client,
            stripe::CreateCustomer {
                email: Some(email),
                name: Some(name),
                metadata: Some(metadata),
                ..Default::default()
            },
        )
        .await
        .map_err(provider)?;

        Ok(customer.id.to_string())
    }

    async fn create_points_checkout(
        &self,
        checkout: PointsCheckout<'_>,
    ) -> Result<CheckoutSession, PaymentError> {
        let mut metadata = HashMap::new();
        metadata.insert("kind".to_string(), "points".to_string());
        metadata.insert("package_id".to_string(), checkout.package_id.to_string());
        metadata.insert("points".to_string(), checkout.points.to_string());

        let client_ref = checkout.user_id.to_string();
        let mut params = stripe::CreateCheckoutSession::new();
        params.mode = Some(stripe::CheckoutSessionMode::Payment);
        params.success_url = Some(checkout.success_url);
        params.cancel_url = Some(checkout.cancel_url);
        params.client_reference_id = Some(&client_ref);
        if let Some(customer_id) = checkout.customer_id {
            params.customer = Some(stripe::CustomerId::from_str(customer_id).map_err(provider)?);
        }
        params.line_items = Some(vec![stripe::CreateCheckoutSessionLineItems {
            price_data: Some(stripe::CreateCheckoutSessionLineItemsPriceData {
                currency: self.currency,
                product_data: Some(stripe::CreateCheckoutSessionLineItemsPriceDataProductData {
                    name: checkout.package_name.to_string(),
                    description: Some(format!("{} points", checkout.points)),
                    ..Default::default()
                }),
                unit_amount: Some(checkout.price_cents),
                ..Default::default()
            }),
            quantity: Some(1),
            ..Default::default()
        }]);
        params.metadata = Some(metadata);

        let session = stripe::CheckoutSession::create(&self.client, params)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to create Stripe checkout session");
                provider(e)
            })?;

        Ok(CheckoutSession {
            session_id: session.id.to_string(),
            checkout_url: session.url.unwrap_or_default(),
        })
    }

    async fn create_subscription_checkout(
        &self,
        checkout: SubscriptionCheckout<'_>,
    ) -> Result<CheckoutSession, PaymentError> {
        let price = self
            .price_for(checkout.tier)
            .ok_or_else(|| PaymentError::NotConfigured(format!("The {} plan", checkout.tier)))?;

        let mut metadata = HashMap::new();
        metadata.insert("kind".to_string(), "subscription".to_string());
        metadata.insert("tier".to_string(), checkout.tier.to_string());

        let client_ref = checkout.user_id.to_string();
        let mut params = stripe::CreateCheckoutSession::new();
        params.mode = Some(stripe::CheckoutSessionMode::Subscription);
        params.customer =
            Some(stripe::CustomerId::from_str(checkout.customer_id).map_err(provider)?);
        params.success_url = Some(checkout.success_url);
        params.cancel_url = Some(checkout.cancel_url);
        params.client_reference_id = Some(&client_ref);
        params.line_items = Some(vec![stripe::CreateCheckoutSessionLineItems {
            price: Some(price.to_string()),
            quantity: Some(1),
            ..Default::default()
        }]);
        params.metadata = Some(metadata);

        let session = stripe::CheckoutSession::create(&self.client, params)
            .await
            .map_err(provider)?;

        Ok(CheckoutSession {
            session_id: session.id.to_string(),
            checkout_url: session.url.unwrap_or_default(),
        })
    }

    async fn cancel_subscription(&self, subscription_id: &str) -> Result<(), PaymentError> {
        let id = stripe::SubscriptionId::from_str(subscription_id).map_err(provider)?;
        let mut params = stripe::UpdateSubscription::new();
        params.cancel_at_period_end = Some(true);
        stripe::Subscription::update(&self.client, &id, params)
            .await
            .map_err(provider)?;
        Ok(())
    }

    fn parse_webhook(&self, payload: &str, signature: &str) -> Result<WebhookEvent, PaymentError> {
        let event = Webhook::construct_event(payload, signature, &self.webhook_secret)
            .map_err(|e| PaymentError::InvalidSignature(e.to_string()))?;

        let decoded = match (&event.type_, &event.data.object) {
            (EventType::CheckoutSessionCompleted, EventObject::CheckoutSession(session)) => {
                self.decode_checkout(session)
            }
            (
                EventType::CustomerSubscriptionCreated
                | EventType::CustomerSubscriptionUpdated
                | EventType::CustomerSubscriptionDeleted,
                EventObject::Subscription(subscription),
            ) => self.decode_subscription(subscription),
            _ => {
                tracing::debug!(event_type = %event.type_, "Unhandled event type");
                PaymentEvent::Ignored
            }
        };

        Ok(WebhookEvent {
            id: event.id.to_string(),
            event_type: event.type_.to_string(),
            event: decoded,
        })
    }
}
