use estuary::domain::{ListingRecord, NO_IMAGE_URL};
use estuary::scraper::{FragmentExtractor, ListingExtractor, ScraperConfig};

const CATEGORY_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>Televisions | Croma</title>
  <meta name="description" content="Buy TVs online">
</head>
<body>
  <header id="header"><div class="logo">Croma</div></header>
  <ul class="product-list">
    <li class="product-item">
      <h3 class="product-title"><a href="/tv-1">Samsung 55" Crystal 4K</a></h3>
      <span class="amount">₹45,990</span>
      <span class="amount">₹64,900</span>
      <div class="product-img-wrapper">
        <img src="https://media.croma.com/lazyLoading.gif" data-src="https://media.croma.com/tv-1.png">
      </div>
    </li>
    <li class="product-item">
      <h3 class="product-title">LG 43" Smart TV</h3>
      <span class="amount">₹29,990</span>
      <img src="https://media.croma.com/lazyLoading.gif">
    </li>
    <li class="product-item">
      <span class="amount">₹9,990</span>
      <span class="amount">₹12,000</span>
      <img alt="no sources">
    </li>
  </ul>
</body>
</html>"#;

fn listings() -> Vec<ListingRecord> {
    ListingExtractor::new(&ScraperConfig::default())
        .unwrap()
        .extract(CATEGORY_PAGE)
}

#[test]
fn three_cards_resolve_in_document_order() {
    let records = listings();
    assert_eq!(records.len(), 3);

    assert_eq!(
        records[0],
        ListingRecord {
            title: "Samsung 55\" Crystal 4K".into(),
            sale_price: "₹45,990".into(),
            price: "₹64,900".into(),
            image_url: "https://media.croma.com/tv-1.png".into(),
        }
    );

    assert_eq!(records[1].title, "LG 43\" Smart TV");
    assert_eq!(records[1].sale_price, "₹29,990");
    assert_eq!(records[1].price, "");
    assert_eq!(records[1].image_url, NO_IMAGE_URL);

    assert_eq!(records[2].title, "N/A");
    assert_eq!(records[2].image_url, NO_IMAGE_URL);
}

#[test]
fn extraction_is_deterministic() {
    assert_eq!(listings(), listings());
}

#[test]
fn protocol_relative_sources_are_kept() {
    let html = r#"<ul><li class="product-item">
        <a href="/tv"><img src="/thumb.png" data-original="//media.croma.com/tv.png"></a>
    </li></ul>"#;
    let records = ListingExtractor::new(&ScraperConfig::default())
        .unwrap()
        .extract(html);
    assert_eq!(records[0].image_url, "//media.croma.com/tv.png");
}

#[test]
fn fragments_from_category_page() {
    let fragments = FragmentExtractor::new().unwrap().extract_fragments(CATEGORY_PAGE);

    let head = fragments.head.expect("head present");
    assert!(head.contains("<title>Televisions | Croma</title>"));
    assert!(head.contains("Buy TVs online"));

    let header = fragments.header.expect("header present");
    assert!(header.contains("class=\"logo\""));
}

#[test]
fn fragments_without_header_region() {
    let html = "<html><head><title>Only head</title></head><body><main>x</main></body></html>";
    let fragments = FragmentExtractor::new().unwrap().extract_fragments(html);

    assert!(fragments.head.is_some());
    assert!(fragments.header.is_none());
}
