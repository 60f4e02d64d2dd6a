//! Integration tests for bucket, domain and CDN setup workflows.

mod common;

use common::{MockCdn, MockDns, MockObjectStore};
use siteship_common::CHUNK_SIZE;
use siteship_storage::{
    CreateBucketOutcome, DeployContext, SiteError, WebsiteConfig, CLOUDFRONT_HOSTED_ZONE_ID,
};

const DOMAIN: &str = "www.example.com";

#[tokio::test]
async fn test_setup_bucket_publishes_website() {
    let store = MockObjectStore::new(CHUNK_SIZE);
    let dns = MockDns::default();
    let cdn = MockCdn::default();
    let context = DeployContext::new(&store, &dns, &cdn, "us-west-2");

    let outcome = context.setup_bucket(DOMAIN).await.unwrap();

    assert_eq!(outcome, CreateBucketOutcome::Created);
    assert!(store.has_public_policy(DOMAIN));
    assert_eq!(
        store.website(DOMAIN),
        Some(("index.html".to_string(), "error.html".to_string()))
    );
}

#[tokio::test]
async fn test_setup_bucket_reuses_owned_bucket() {
    let store = MockObjectStore::new(CHUNK_SIZE);
    store.set_bucket_region(DOMAIN, "us-east-1");
    let dns = MockDns::default();
    let cdn = MockCdn::default();
    let context = DeployContext::new(&store, &dns, &cdn, "us-east-1").with_website(WebsiteConfig {
        index_document: "home.html".to_string(),
        error_document: "404.html".to_string(),
    });

    let outcome = context.setup_bucket(DOMAIN).await.unwrap();

    assert_eq!(outcome, CreateBucketOutcome::AlreadyOwned);
    assert_eq!(
        store.website(DOMAIN),
        Some(("home.html".to_string(), "404.html".to_string()))
    );
}

#[tokio::test]
async fn test_bucket_url_uses_region_endpoint() {
    let store = MockObjectStore::new(CHUNK_SIZE);
    store.set_bucket_region("my-site", "eu-west-2");
    let dns = MockDns::default();
    let cdn = MockCdn::default();
    let context = DeployContext::new(&store, &dns, &cdn, "us-east-1");

    let url = context.bucket_url("my-site").await.unwrap();

    assert_eq!(url, "http://my-site.s3-website.eu-west-2.amazonaws.com");
}

#[tokio::test]
async fn test_bucket_url_unknown_region() {
    let store = MockObjectStore::new(CHUNK_SIZE);
    store.set_bucket_region("my-site", "mars-north-1");
    let dns = MockDns::default();
    let cdn = MockCdn::default();
    let context = DeployContext::new(&store, &dns, &cdn, "us-east-1");

    let result = context.bucket_url("my-site").await;

    assert!(matches!(result, Err(SiteError::UnknownRegion { region }) if region == "mars-north-1"));
}

#[tokio::test]
async fn test_setup_domain_uses_existing_zone() {
    let store = MockObjectStore::new(CHUNK_SIZE);
    store.set_bucket_region(DOMAIN, "us-east-1");
    let dns = MockDns::default().with_zone("/hostedzone/ZEXISTING", "example.com.");
    let cdn = MockCdn::default();
    let context = DeployContext::new(&store, &dns, &cdn, "us-east-1");

    let url = context.setup_domain(DOMAIN).await.unwrap();

    assert_eq!(url, "http://www.example.com");
    assert_eq!(dns.zones_created(), 0);
    let records = dns.records();
    assert_eq!(records.len(), 1);
    let (zone_id, name, target) = &records[0];
    assert_eq!(zone_id, "/hostedzone/ZEXISTING");
    assert_eq!(name, DOMAIN);
    assert_eq!(target.dns_name, "s3-website-us-east-1.amazonaws.com");
    assert_eq!(target.hosted_zone_id, "Z3AQBSTGFYJSTF");
}

#[tokio::test]
async fn test_setup_domain_creates_apex_zone() {
    let store = MockObjectStore::new(CHUNK_SIZE);
    store.set_bucket_region("blog.example.org", "eu-central-1");
    let dns = MockDns::default();
    let cdn = MockCdn::default();
    let context = DeployContext::new(&store, &dns, &cdn, "us-east-1");

    context.setup_domain("blog.example.org").await.unwrap();

    assert_eq!(dns.zones_created(), 1);
    assert_eq!(dns.zones()[0].name, "example.org.");
}

#[tokio::test]
async fn test_setup_domain_ignores_zone_sharing_only_a_suffix() {
    let store = MockObjectStore::new(CHUNK_SIZE);
    store.set_bucket_region(DOMAIN, "us-east-1");
    let dns = MockDns::default().with_zone("/hostedzone/ZOTHER", "notexample.com.");
    let cdn = MockCdn::default();
    let context = DeployContext::new(&store, &dns, &cdn, "us-east-1");

    context.setup_domain(DOMAIN).await.unwrap();

    assert_eq!(dns.zones_created(), 1);
    let records = dns.records();
    assert_eq!(records.len(), 1);
    assert_ne!(records[0].0, "/hostedzone/ZOTHER");
}

#[tokio::test]
async fn test_setup_domain_is_idempotent() {
    let store = MockObjectStore::new(CHUNK_SIZE);
    store.set_bucket_region(DOMAIN, "us-east-1");
    let dns = MockDns::default();
    let cdn = MockCdn::default();
    let context = DeployContext::new(&store, &dns, &cdn, "us-east-1");

    context.setup_domain(DOMAIN).await.unwrap();
    context.setup_domain(DOMAIN).await.unwrap();

    assert_eq!(dns.zones_created(), 1);
    assert_eq!(dns.records().len(), 1);
}

#[tokio::test]
async fn test_setup_cdn_reuses_distribution() {
    let store = MockObjectStore::new(CHUNK_SIZE);
    let dns = MockDns::default().with_zone("/hostedzone/Z1", "example.com.");
    let cdn = MockCdn::default().with_distribution("EXISTING", "d123.cloudfront.net", DOMAIN);
    let context = DeployContext::new(&store, &dns, &cdn, "us-east-1");

    let url = context.setup_cdn(DOMAIN).await.unwrap();

    assert_eq!(url, "https://www.example.com");
    assert!(cdn.created().is_empty());
    assert!(cdn.waited().is_empty());
    let (_, _, target) = &dns.records()[0];
    assert_eq!(target.dns_name, "d123.cloudfront.net");
    assert_eq!(target.hosted_zone_id, CLOUDFRONT_HOSTED_ZONE_ID);
}

#[tokio::test]
async fn test_setup_cdn_creates_distribution_with_wildcard_certificate() {
    let store = MockObjectStore::new(CHUNK_SIZE);
    let dns = MockDns::default();
    let cdn = MockCdn::default().with_certificate(
        "arn:aws:acm:us-east-1:123456789012:certificate/abc",
        "example.com",
        &["example.com", "*.example.com"],
    );
    let context = DeployContext::new(&store, &dns, &cdn, "us-east-1");

    context.setup_cdn(DOMAIN).await.unwrap();

    assert_eq!(
        cdn.created(),
        vec![(
            DOMAIN.to_string(),
            "arn:aws:acm:us-east-1:123456789012:certificate/abc".to_string()
        )]
    );
    assert_eq!(cdn.waited(), vec!["E1".to_string()]);
    assert_eq!(dns.zones_created(), 1);
    let (_, name, target) = &dns.records()[0];
    assert_eq!(name, DOMAIN);
    assert_eq!(target.dns_name, "d1.cloudfront.net");
}

#[tokio::test]
async fn test_setup_cdn_without_certificate_fails() {
    let store = MockObjectStore::new(CHUNK_SIZE);
    let dns = MockDns::default();
    let cdn = MockCdn::default().with_certificate("arn:other", "example.org", &["example.org"]);
    let context = DeployContext::new(&store, &dns, &cdn, "us-east-1");

    let result = context.setup_cdn(DOMAIN).await;

    assert!(matches!(result, Err(SiteError::NoCertificate { .. })));
    assert!(cdn.created().is_empty());
    assert!(dns.records().is_empty());
}
