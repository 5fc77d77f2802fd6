//! Stock knowledge base content for new deployments.

use crabdesk_core::error::StoreError;
use crabdesk_core::store::{KnowledgeEntry, KnowledgeStore};
use tracing::info;

/// Seed the knowledge base with the stock customer-service entries.
///
/// Returns the number of entries written. Idempotence is the caller's
/// concern: seeding an already-seeded store duplicates content.
pub async fn seed_knowledge_base(store: &dyn KnowledgeStore) -> Result<usize, StoreError> {
    let entries = stock_entries();
    let total = entries.len();
    for entry in entries {
        store.add(entry).await?;
    }
    info!(entries = total, "Knowledge base seeded");
    Ok(total)
}

fn stock_entries() -> Vec<KnowledgeEntry> {
    let raw: [(&str, &str, &str, &str); 8] = [
        (
            "Return Policy",
            "Our return policy allows customers to return items within 30 days of purchase for a full refund. Items must be in original condition with tags attached. Returns can be processed online or in-store. Refunds are issued within 5-7 business days after we receive the returned item.",
            "Policies",
            "return refund 30-days original-condition",
        ),
        (
            "Shipping Information",
            "We offer multiple shipping options: Standard (5-8 business days, free on orders over $50), Express (2-3 business days, $9.99), and Overnight (next business day, $19.99). Tracking information is provided for all shipments.",
            "Shipping",
            "shipping standard express overnight tracking",
        ),
        (
            "Payment Methods",
            "We accept all major credit cards (Visa, MasterCard, American Express, Discover), PayPal, Apple Pay, Google Pay, and gift cards. For orders over $500, we also offer payment plans.",
            "Payment",
            "credit-card paypal apple-pay google-pay gift-cards payment-plans",
        ),
        (
            "Product Warranty",
            "All products come with a 1-year manufacturer warranty covering defects in materials and workmanship. Extended warranties are available for purchase. Warranty claims can be submitted online or by calling our support team.",
            "Warranty",
            "warranty manufacturing-defects extended-warranty claims",
        ),
        (
            "Account Management",
            "You can manage your account through our customer portal where you can view order history, update payment methods, change delivery addresses, and track package status. Password reset can be done through the login page.",
            "Account",
            "account portal order-history payment-methods address password-reset",
        ),
        (
            "Technical Support",
            "For technical issues with products, please check our troubleshooting guides on the product pages or contact our technical support team. We provide step-by-step troubleshooting, warranty service, and replacement for defective items.",
            "Support",
            "technical-support troubleshooting warranty-service replacements",
        ),
        (
            "International Shipping",
            "We ship internationally to most countries worldwide. International shipping takes 7-14 business days. Duties and taxes are the responsibility of the customer. Some restrictions may apply based on destination country.",
            "International",
            "international-shipping duties taxes restrictions destination-country",
        ),
        (
            "Price Match",
            "We offer a 30-day price match guarantee. If you find an item for less from an authorized retailer, we'll match the price plus give you 10% of the difference as store credit. Original receipt required.",
            "Policies",
            "price-match guarantee authorized-retailer difference store-credit",
        ),
    ];

    raw.into_iter()
        .map(|(title, content, category, tags)| KnowledgeEntry {
            title: title.into(),
            content: content.into(),
            category: category.into(),
            tags: tags.into(),
        })
        .collect()
}
