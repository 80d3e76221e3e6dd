use crate::domain::sale::SaleRequest;
use crate::error::Result;

/// Renders the auto-submitting HTML form that redirects the payer's browser
/// to the EPP hosted checkout.
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckoutFormBuilder;

impl CheckoutFormBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Builds the redirect form: one POST form targeting `target_url` with a
    /// single hidden `saleDetail` field holding the serialized sale payload,
    /// plus an inline script that submits the form on load.
    ///
    /// The payload is embedded as a quoted string with internal double quotes
    /// escaped as `\"` and nothing else; the processor parses that exact byte
    /// sequence, so no further HTML escaping is applied.
    pub fn build(&self, sale: &SaleRequest, target_url: &str) -> Result<String> {
        let json = serde_json::to_string(sale)?;
        let payload = quote_payload(&json);
        Ok(format!(
            "<form id='__PostForm' name='__PostForm' action='{target_url}' method='POST'>\
             <input type='hidden' name='saleDetail' value='{payload}'/>\
             </form>\
             <script language='javascript'>var v__PostForm=document.__PostForm;v__PostForm.submit();</script>"
        ))
    }
}

fn quote_payload(json: &str) -> String {
    format!("\"{}\"", json.replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sale::SaleItem;
    use rust_decimal_macros::dec;

    fn sale() -> SaleRequest {
        SaleRequest {
            order_key: "ORD123".into(),
            application_code: "3256d54a".into(),
            first_name: "John".into(),
            last_name: "Doe".into(),
            address1: "123 Main St".into(),
            city: "Harrisburg".into(),
            state_code: "PA".into(),
            zip_code: "17101".into(),
            total_amount: Some(dec!(10.00)),
            email: "test@example.com".into(),
            items: vec![SaleItem {
                count: 1,
                description: "Test Item".into(),
                amount: dec!(10.00),
                item_key: "ORD123".into(),
                ..SaleItem::default()
            }],
            ..SaleRequest::default()
        }
    }

    #[test]
    fn test_quote_payload_escapes_double_quotes_only() {
        assert_eq!(
            quote_payload(r#"{"OrderKey":"ORD1"}"#),
            r#""{\"OrderKey\":\"ORD1\"}""#
        );
        // Angle brackets and ampersands pass through untouched.
        assert_eq!(quote_payload("<b>&</b>"), "\"<b>&</b>\"");
    }

    #[test]
    fn test_build_produces_single_auto_submitting_form() {
        let html = CheckoutFormBuilder::new()
            .build(&sale(), "https://epp.example.com/Payment/Index")
            .unwrap();

        assert_eq!(html.matches("<form").count(), 1);
        assert!(html.contains("action='https://epp.example.com/Payment/Index'"));
        assert!(html.contains("name='saleDetail'"));
        assert!(html.contains("v__PostForm.submit()"));
    }

    #[test]
    fn test_build_embeds_quoted_escaped_payload() {
        let html = CheckoutFormBuilder::new()
            .build(&sale(), "https://epp.example.com/Payment/Index")
            .unwrap();

        // The value attribute starts with an escaped-quote-wrapped JSON string.
        assert!(html.contains(r#"value='"{\"SaleDetailId\":0"#));
        assert!(html.contains(r#"\"OrderKey\":\"ORD123\""#));
    }
}
