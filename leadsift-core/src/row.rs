use serde::{Deserialize, Serialize};

/// Column order of an exported lead sheet.
pub const SHEET_HEADER: [&str; 46] = [
    "id",
    "domain",
    "updated_at",
    "contact_first_name",
    "contact_last_name",
    "contact_full_name",
    "contact_email",
    "contact_title",
    "contact_headline",
    "contact_linkedin_url",
    "contact_is_valid_email",
    "contact_validation_status",
    "contact_validation_source",
    "organization_primary_domain",
    "organization_linkedin_url",
    "organization_facebook_url",
    "organization_founded_year",
    "organization_city",
    "organization_country",
    "organization_address",
    "organization_estimated_num_employees",
    "organization_platform",
    "organization_is_ecommerce",
    "pages_all",
    "pages_about",
    "pages_contact",
    "pages_product",
    "pages_collection",
    "pages_blog",
    "pages_is_ecommerce",
    "pages_contact_page_url",
    "pages_contact_page_email",
    "pages_contact_page_social_links_youtube",
    "pages_contact_page_social_links_instagram",
    "pages_contact_page_social_links_tiktok",
    "pages_about_copy",
    "pages_product_copy",
    "pages_blog_copy",
    "email_candidates",
    "integrations_klaviyo",
    "integrations_meta",
    "pages_contact_page_social_links_facebook",
    "pages_contact_page_social_links_linkedin",
    "pages_contact_page_social_links",
    "pages_contact_page_social_links_twitter",
    "personalized_icebreaker",
];

/// One enriched lead, field-for-field with [`SHEET_HEADER`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadRow {
    pub id: String,
    pub domain: String,
    pub updated_at: String,
    pub contact_first_name: String,
    pub contact_last_name: String,
    pub contact_full_name: String,
    pub contact_email: String,
    pub contact_title: String,
    pub contact_headline: String,
    pub contact_linkedin_url: String,
    pub contact_is_valid_email: bool,
    pub contact_validation_status: String,
    pub contact_validation_source: String,
    pub organization_primary_domain: String,
    pub organization_linkedin_url: String,
    pub organization_facebook_url: String,
    pub organization_founded_year: String,
    pub organization_city: String,
    pub organization_country: String,
    pub organization_address: String,
    pub organization_estimated_num_employees: String,
    pub organization_platform: String,
    pub organization_is_ecommerce: bool,
    pub pages_all: String,
    pub pages_about: String,
    pub pages_contact: String,
    pub pages_product: String,
    pub pages_collection: String,
    pub pages_blog: String,
    pub pages_is_ecommerce: bool,
    pub pages_contact_page_url: String,
    pub pages_contact_page_email: String,
    pub pages_contact_page_social_links_youtube: String,
    pub pages_contact_page_social_links_instagram: String,
    pub pages_contact_page_social_links_tiktok: String,
    pub pages_about_copy: String,
    pub pages_product_copy: String,
    pub pages_blog_copy: String,
    pub email_candidates: String,
    pub integrations_klaviyo: bool,
    pub integrations_meta: bool,
    pub pages_contact_page_social_links_facebook: String,
    pub pages_contact_page_social_links_linkedin: String,
    pub pages_contact_page_social_links: String,
    pub pages_contact_page_social_links_twitter: String,
    pub personalized_icebreaker: String,
}

fn flag(value: bool) -> String {
    if value { "TRUE" } else { "FALSE" }.to_string()
}

impl LeadRow {
    /// Cell values in [`SHEET_HEADER`] order, booleans as `TRUE`/`FALSE`.
    pub fn to_record(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.domain.clone(),
            self.updated_at.clone(),
            self.contact_first_name.clone(),
            self.contact_last_name.clone(),
            self.contact_full_name.clone(),
            self.contact_email.clone(),
            self.contact_title.clone(),
            self.contact_headline.clone(),
            self.contact_linkedin_url.clone(),
            flag(self.contact_is_valid_email),
            self.contact_validation_status.clone(),
            self.contact_validation_source.clone(),
            self.organization_primary_domain.clone(),
            self.organization_linkedin_url.clone(),
            self.organization_facebook_url.clone(),
            self.organization_founded_year.clone(),
            self.organization_city.clone(),
            self.organization_country.clone(),
            self.organization_address.clone(),
            self.organization_estimated_num_employees.clone(),
            self.organization_platform.clone(),
            flag(self.organization_is_ecommerce),
            self.pages_all.clone(),
            self.pages_about.clone(),
            self.pages_contact.clone(),
            self.pages_product.clone(),
            self.pages_collection.clone(),
            self.pages_blog.clone(),
            flag(self.pages_is_ecommerce),
            self.pages_contact_page_url.clone(),
            self.pages_contact_page_email.clone(),
            self.pages_contact_page_social_links_youtube.clone(),
            self.pages_contact_page_social_links_instagram.clone(),
            self.pages_contact_page_social_links_tiktok.clone(),
            self.pages_about_copy.clone(),
            self.pages_product_copy.clone(),
            self.pages_blog_copy.clone(),
            self.email_candidates.clone(),
            flag(self.integrations_klaviyo),
            flag(self.integrations_meta),
            self.pages_contact_page_social_links_facebook.clone(),
            self.pages_contact_page_social_links_linkedin.clone(),
            self.pages_contact_page_social_links.clone(),
            self.pages_contact_page_social_links_twitter.clone(),
            self.personalized_icebreaker.clone(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_matches_header_width() {
        assert_eq!(LeadRow::default().to_record().len(), SHEET_HEADER.len());
    }

    #[test]
    fn test_record_positions() {
        let row = LeadRow {
            id: "row-1".to_string(),
            domain: "shop.io".to_string(),
            contact_is_valid_email: true,
            pages_about: "https://shop.io/about".to_string(),
            personalized_icebreaker: "Hey Ada, ...".to_string(),
            ..Default::default()
        };
        let record = row.to_record();
        let cell = |name: &str| {
            let idx = SHEET_HEADER.iter().position(|h| *h == name).unwrap();
            record[idx].as_str()
        };

        assert_eq!(cell("id"), "row-1");
        assert_eq!(cell("domain"), "shop.io");
        assert_eq!(cell("contact_is_valid_email"), "TRUE");
        assert_eq!(cell("organization_is_ecommerce"), "FALSE");
        assert_eq!(cell("pages_about"), "https://shop.io/about");
        assert_eq!(cell("personalized_icebreaker"), "Hey Ada, ...");
    }

    #[test]
    fn test_serde_field_names_follow_header() {
        let value = serde_json::to_value(LeadRow::default()).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object.len(), SHEET_HEADER.len());
        for column in SHEET_HEADER {
            assert!(object.contains_key(column), "missing {}", column);
        }
    }
}
