// Deterministic outreach email generation. Same contact in, byte-identical
// subject/html/text out; all personalization is plain template substitution.

use crate::models::{BusinessContact, PriceEstimate};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

#[derive(Debug, Clone, PartialEq)]
pub struct EmailContent {
    pub subject: String,
    pub html: String,
    pub text: String,
}

pub struct EmailComposer {
    site_base_url: String,
}

impl EmailComposer {
    pub fn new(site_base_url: impl Into<String>) -> Self {
        let mut base = site_base_url.into();
        while base.ends_with('/') {
            base.pop();
        }
        Self {
            site_base_url: base,
        }
    }

    pub fn compose(&self, contact: &BusinessContact) -> EmailContent {
        let subject = format!(
            "Get more {} customers in {}",
            contact.category, contact.location
        );

        let price_line = match &contact.price_estimate {
            PriceEstimate::Range { low, high } => format!(
                "Homeowners near you are comparing {} quotes between £{} and £{}.",
                contact.category, low, high
            ),
            PriceEstimate::Unknown => format!(
                "Homeowners near you are actively comparing {} quotes.",
                contact.category
            ),
        };

        let cta_link = self.cta_link();
        let unsubscribe_link = self.unsubscribe_link(&contact.email);

        let text = format!(
            "Hi {name},\n\n\
             We run a price comparison service for home improvement work and \
             homeowners in {location} regularly ask us for trusted {category} \
             businesses. {price_line}\n\n\
             Listing your business is free and takes a couple of minutes:\n\
             {cta}\n\n\
             Best regards,\n\
             The PriceFair team\n\n\
             Don't want to hear from us again? {unsub}\n",
            name = contact.name,
            location = contact.location,
            category = contact.category,
            price_line = price_line,
            cta = cta_link,
            unsub = unsubscribe_link,
        );

        let html = format!(
            "<html><body style=\"font-family:Arial,sans-serif;color:#333\">\
             <p>Hi {name},</p>\
             <p>We run a price comparison service for home improvement work and \
             homeowners in <strong>{location}</strong> regularly ask us for trusted \
             <strong>{category}</strong> businesses. {price_line}</p>\
             <p><a href=\"{cta}\" style=\"background:#1a7f37;color:#fff;padding:10px 18px;\
             text-decoration:none;border-radius:4px\">List your business for free</a></p>\
             <p>Best regards,<br>The PriceFair team</p>\
             <p style=\"font-size:12px;color:#888\">Don't want to hear from us again? \
             <a href=\"{unsub}\">Unsubscribe</a></p>\
             </body></html>",
            name = contact.name,
            location = contact.location,
            category = contact.category,
            price_line = price_line,
            cta = cta_link,
            unsub = unsubscribe_link,
        );

        EmailContent {
            subject,
            html,
            text,
        }
    }

    fn cta_link(&self) -> String {
        format!(
            "{}/partners?utm_source=outreach&utm_medium=email",
            self.site_base_url
        )
    }

    fn unsubscribe_link(&self, email: &str) -> String {
        format!(
            "{}/unsubscribe?token={}",
            self.site_base_url,
            URL_SAFE_NO_PAD.encode(email.as_bytes())
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact() -> BusinessContact {
        BusinessContact {
            name: "Leeds Kitchen Fitters".to_string(),
            email: "info@leedskitchenfitters.co.uk".to_string(),
            phone: None,
            website: Some("https://leedskitchenfitters.co.uk".to_string()),
            location: "Leeds".to_string(),
            category: "kitchen".to_string(),
            source_id: None,
            rating: Some(4.6),
            price_estimate: PriceEstimate::Range {
                low: 4500,
                high: 16000,
            },
            opening_hours: None,
        }
    }

    #[test]
    fn composition_is_deterministic() {
        let composer = EmailComposer::new("https://www.pricefair.co.uk");
        let a = composer.compose(&contact());
        let b = composer.compose(&contact());
        assert_eq!(a, b);
    }

    #[test]
    fn unsubscribe_token_encodes_recipient() {
        let composer = EmailComposer::new("https://www.pricefair.co.uk/");
        let content = composer.compose(&contact());

        let token = URL_SAFE_NO_PAD.encode("info@leedskitchenfitters.co.uk");
        let expected = format!("https://www.pricefair.co.uk/unsubscribe?token={}", token);
        assert!(content.html.contains(&expected));
        assert!(content.text.contains(&expected));
    }

    #[test]
    fn unknown_price_never_prints_a_number() {
        let composer = EmailComposer::new("https://www.pricefair.co.uk");
        let mut c = contact();
        c.price_estimate = PriceEstimate::Unknown;
        let content = composer.compose(&c);
        assert!(!content.text.contains('£'));
    }

    #[test]
    fn subject_carries_category_and_location() {
        let composer = EmailComposer::new("https://www.pricefair.co.uk");
        let content = composer.compose(&contact());
        assert_eq!(content.subject, "Get more kitchen customers in Leeds");
    }
}
