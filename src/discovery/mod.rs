pub mod national;
pub mod pricing;
pub mod providers;
pub mod relevance;
pub mod terms;

use crate::errors::{CampaignError, CampaignResult};
use crate::models::BusinessContact;
use providers::{DirectoryProvider, ProviderListing};
use tracing::{debug, info, warn};

// A listing plus the index of the provider that produced it, so the
// follow-up detail lookup goes back to the same provider. National
// suppliers carry no provider index and no detail lookup.
struct Candidate {
    listing: ProviderListing,
    provider_idx: Option<usize>,
    curated: bool,
}

pub struct BusinessDiscovery {
    providers: Vec<Box<dyn DirectoryProvider>>,
    results_per_pair: usize,
}

impl BusinessDiscovery {
    pub fn new(providers: Vec<Box<dyn DirectoryProvider>>, results_per_pair: usize) -> Self {
        Self {
            providers,
            results_per_pair,
        }
    }

    /// The live discovery path never fabricates businesses; with no
    /// provider configured it must fail hard instead.
    pub fn ensure_configured(&self) -> CampaignResult<()> {
        if self.providers.is_empty() {
            return Err(CampaignError::ProviderConfiguration);
        }
        Ok(())
    }

    pub async fn discover(
        &self,
        category: &str,
        location: &str,
    ) -> CampaignResult<Vec<BusinessContact>> {
        self.ensure_configured()?;

        let search_terms = terms::expand_search_terms(category);
        debug!(
            "Discovering '{}' in '{}' via {} terms",
            category,
            location,
            search_terms.len()
        );

        let mut candidates: Vec<Candidate> = Vec::new();
        let mut any_query_succeeded = false;
        let mut last_error: Option<CampaignError> = None;

        for term in &search_terms {
            match self.search_with_fallback(term, location).await {
                Ok((listings, provider_idx)) => {
                    any_query_succeeded = true;
                    candidates.extend(listings.into_iter().map(|listing| Candidate {
                        listing,
                        provider_idx: Some(provider_idx),
                        curated: false,
                    }));
                }
                Err(e) => {
                    warn!("All providers failed for term '{}': {}", term, e);
                    last_error = Some(e);
                }
            }
        }

        if !any_query_succeeded {
            if let Some(e) = last_error {
                // every term failed on every provider: the pair fails
                return Err(e);
            }
        }

        for supplier in national::national_suppliers_for(category) {
            candidates.push(Candidate {
                listing: ProviderListing {
                    name: supplier.name.to_string(),
                    address: None,
                    tags: Vec::new(),
                    rating: None,
                    source_id: None,
                    website: Some(supplier.website.to_string()),
                    phone: Some(supplier.phone.to_string()),
                },
                provider_idx: None,
                curated: true,
            });
        }

        let candidates = dedupe_candidates(candidates);

        let mut relevant: Vec<Candidate> = candidates
            .into_iter()
            .filter(|c| relevance::is_relevant(&c.listing.name, &c.listing.tags, category))
            .collect();

        // Best live results first; curated national entries fill the tail.
        relevant.sort_by(|a, b| {
            a.curated
                .cmp(&b.curated)
                .then_with(|| rating_key(b).total_cmp(&rating_key(a)))
        });
        relevant.truncate(self.results_per_pair);

        let mut contacts = Vec::with_capacity(relevant.len());
        for candidate in relevant {
            contacts.push(self.enrich(candidate, category, location).await);
        }

        info!(
            "Discovery for '{}' in '{}' returned {} contacts",
            category,
            location,
            contacts.len()
        );
        Ok(contacts)
    }

    // Primary provider first, then the secondary as fallback. Only when
    // every configured provider fails does the term itself fail.
    async fn search_with_fallback(
        &self,
        term: &str,
        location: &str,
    ) -> CampaignResult<(Vec<ProviderListing>, usize)> {
        let mut last_error = CampaignError::ProviderConfiguration;
        for (idx, provider) in self.providers.iter().enumerate() {
            match provider.search(term, location).await {
                Ok(listings) => return Ok((listings, idx)),
                Err(e) => {
                    warn!("Provider '{}' failed for '{}': {}", provider.name(), term, e);
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }

    // Best-effort detail lookup; a failure here degrades the contact, it
    // never drops it.
    async fn enrich(
        &self,
        candidate: Candidate,
        category: &str,
        location: &str,
    ) -> BusinessContact {
        let curated = candidate.curated;
        let mut listing = candidate.listing;
        let mut opening_hours = None;

        if let (Some(idx), Some(source_id)) = (candidate.provider_idx, listing.source_id.clone()) {
            match self.providers[idx].details(&source_id).await {
                Ok(Some(details)) => {
                    listing.phone = details.phone.or_else(|| listing.phone.take());
                    listing.website = details.website.or_else(|| listing.website.take());
                    opening_hours = details.opening_hours;
                }
                Ok(None) => {}
                Err(e) => warn!("Detail lookup failed for '{}': {}", listing.name, e),
            }
        }

        self.build_contact(listing, curated, category, location, opening_hours)
    }

    fn build_contact(
        &self,
        listing: ProviderListing,
        curated: bool,
        category: &str,
        location: &str,
        opening_hours: Option<String>,
    ) -> BusinessContact {
        // curated national suppliers are known product suppliers; everything
        // else is priced off its directory tags
        let price_estimate = if curated {
            pricing::estimate(category, pricing::BusinessClass::Supplier)
        } else {
            pricing::estimate(category, pricing::classify(&listing.tags))
        };

        BusinessContact {
            email: derive_contact_email(&listing.name, listing.website.as_deref()),
            name: listing.name,
            phone: listing.phone,
            website: listing.website,
            location: location.to_string(),
            category: category.to_string(),
            source_id: listing.source_id,
            rating: listing.rating,
            price_estimate,
            opening_hours,
        }
    }
}

fn rating_key(candidate: &Candidate) -> f64 {
    candidate.listing.rating.unwrap_or(0.0)
}

// Dedup across providers and the national table by (name, contact) pair,
// first occurrence wins.
fn dedupe_candidates(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let contact_key = candidate
            .listing
            .website
            .as_deref()
            .or(candidate.listing.phone.as_deref())
            .unwrap_or("")
            .to_lowercase();
        let key = (candidate.listing.name.to_lowercase(), contact_key);
        if seen.insert(key) {
            out.push(candidate);
        }
    }
    out
}

/// Deterministic contact address: the business's own domain when a website
/// is known, otherwise synthesized from the name.
pub fn derive_contact_email(name: &str, website: Option<&str>) -> String {
    if let Some(site) = website {
        let with_scheme = if site.contains("://") {
            site.to_string()
        } else {
            format!("https://{}", site)
        };
        if let Ok(parsed) = url::Url::parse(&with_scheme) {
            if let Some(host) = parsed.host_str() {
                let host = host.strip_prefix("www.").unwrap_or(host);
                if !host.is_empty() {
                    return format!("info@{}", host);
                }
            }
        }
    }

    let slug = regex::Regex::new(r"[^a-z0-9]+")
        .unwrap()
        .replace_all(&name.to_lowercase(), "")
        .to_string();
    format!("contact@{}.co.uk", slug)
}
