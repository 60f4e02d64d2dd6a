//! Static website endpoints and the documents that publish a bucket.

use serde_json::{json, Value};

/// Route 53 hosted zone ID for every CloudFront distribution.
pub const CLOUDFRONT_HOSTED_ZONE_ID: &str = "Z2FDTNDATAQYW2";

/// S3 static website endpoint of one region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WebsiteEndpoint {
    /// Region name, e.g. `us-east-1`.
    pub region: &'static str,
    /// Endpoint host, e.g. `s3-website-us-east-1.amazonaws.com`.
    pub host: &'static str,
    /// Route 53 hosted zone ID of the endpoint, used for alias records.
    pub zone_id: &'static str,
}

#[rustfmt::skip]
const ENDPOINTS: &[WebsiteEndpoint] = &[
    WebsiteEndpoint { region: "us-east-2", host: "s3-website.us-east-2.amazonaws.com", zone_id: "Z2O1EMRO9K5GLX" },
    WebsiteEndpoint { region: "us-east-1", host: "s3-website-us-east-1.amazonaws.com", zone_id: "Z3AQBSTGFYJSTF" },
    WebsiteEndpoint { region: "us-west-1", host: "s3-website-us-west-1.amazonaws.com", zone_id: "Z2F56UZL2M1ACD" },
    WebsiteEndpoint { region: "us-west-2", host: "s3-website-us-west-2.amazonaws.com", zone_id: "Z3BJ6K6RIION7M" },
    WebsiteEndpoint { region: "ap-south-1", host: "s3-website.ap-south-1.amazonaws.com", zone_id: "Z11RGJOFQNVJUP" },
    WebsiteEndpoint { region: "ap-northeast-2", host: "s3-website.ap-northeast-2.amazonaws.com", zone_id: "Z3W03O7B5YMIYP" },
    WebsiteEndpoint { region: "ap-southeast-1", host: "s3-website-ap-southeast-1.amazonaws.com", zone_id: "Z3O0J2DXBE1FTB" },
    WebsiteEndpoint { region: "ap-southeast-2", host: "s3-website-ap-southeast-2.amazonaws.com", zone_id: "Z1WCIGYICN2BYD" },
    WebsiteEndpoint { region: "ap-northeast-1", host: "s3-website-ap-northeast-1.amazonaws.com", zone_id: "Z2M4EHUR26P7ZW" },
    WebsiteEndpoint { region: "ca-central-1", host: "s3-website.ca-central-1.amazonaws.com", zone_id: "Z1QDHH18159H29" },
    WebsiteEndpoint { region: "eu-central-1", host: "s3-website.eu-central-1.amazonaws.com", zone_id: "Z21DNDUVLTQW6Q" },
    WebsiteEndpoint { region: "eu-west-1", host: "s3-website-eu-west-1.amazonaws.com", zone_id: "Z1BKCTXD74EZPE" },
    WebsiteEndpoint { region: "eu-west-2", host: "s3-website.eu-west-2.amazonaws.com", zone_id: "Z3GKZC51ZF0DB4" },
    WebsiteEndpoint { region: "eu-west-3", host: "s3-website.eu-west-3.amazonaws.com", zone_id: "Z3R1K369G5AVDG" },
    WebsiteEndpoint { region: "sa-east-1", host: "s3-website-sa-east-1.amazonaws.com", zone_id: "Z7KQH4QJS55SO" },
];

/// Look up the website endpoint of a region.
pub fn website_endpoint(region: &str) -> Option<&'static WebsiteEndpoint> {
    ENDPOINTS.iter().find(|endpoint| endpoint.region == region)
}

/// Website URL of a bucket, `None` if the region has no known endpoint.
pub fn website_url(bucket: &str, region: &str) -> Option<String> {
    website_endpoint(region).map(|endpoint| format!("http://{}.{}", bucket, endpoint.host))
}

/// Bucket policy granting anonymous read access to every object.
pub fn public_read_policy(bucket: &str) -> Value {
    json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Sid": "PublicReadGetObject",
            "Effect": "Allow",
            "Principal": "*",
            "Action": ["s3:GetObject"],
            "Resource": [format!("arn:aws:s3:::{}/*", bucket)]
        }]
    })
}

/// Whether a hosted zone named `zone_name` serves `domain`.
///
/// The zone name carries a trailing dot. It matches the domain itself or any
/// subdomain of it, compared on whole labels.
pub fn zone_matches_domain(domain: &str, zone_name: &str) -> bool {
    let zone = zone_name.strip_suffix('.').unwrap_or(zone_name);
    let domain = domain.strip_suffix('.').unwrap_or(domain);
    !zone.is_empty() && (domain == zone || domain.ends_with(&format!(".{}", zone)))
}

/// Name of the zone to create for `domain`: its last two labels plus a
/// trailing dot.
pub fn apex_zone_name(domain: &str) -> String {
    let labels: Vec<&str> = domain.trim_end_matches('.').split('.').collect();
    let start = labels.len().saturating_sub(2);
    format!("{}.", labels[start..].join("."))
}

/// Whether any certificate name covers `domain`, exactly or through a
/// single-label wildcard.
pub fn certificate_covers<S: AsRef<str>>(domain: &str, names: &[S]) -> bool {
    names.iter().any(|name| {
        let name = name.as_ref();
        if name == domain {
            return true;
        }
        match (name.strip_prefix("*."), domain.split_once('.')) {
            (Some(parent), Some((_, domain_parent))) => parent == domain_parent,
            _ => false,
        }
    })
}
