use carttotal_core_types::PriceBounds;
use perceiver_price::{extract_amount, resolve_selector, CandidateScanner, HtmlDocument};

const CHECKOUT: &str = r#"<!doctype html>
<html>
<head><title>Checkout - Example Store</title><style>.x { color: red }</style></head>
<body>
  <header><div class="nav">Cart (2)</div></header>
  <main>
    <table class="items">
      <tr><td>Blue mug</td><td class="price">$12.00</td></tr>
      <tr><td>Red mug</td><td class="price">$14.00</td></tr>
    </table>
    <section class="summary">
      <div class="line"><span>Subtotal</span> <span>$26.00</span></div>
      <div class="line">Subtotal $26.00</div>
      <div class="line">Estimated tax $2.34</div>
      <div class="line grand">Order Total $28.34</div>
    </section>
    <aside id="sticky"><p>Order Total $28.34</p></aside>
  </main>
</body>
</html>"#;

#[test]
fn scan_finds_summary_lines_in_document_order() {
    let doc = HtmlDocument::parse(CHECKOUT);
    let candidates = CandidateScanner::default().scan(&doc);
    let texts: Vec<&str> = candidates.iter().map(|c| c.text.as_str()).collect();

    assert!(texts.contains(&"Subtotal $26.00"));
    assert!(texts.contains(&"Order Total $28.34"));
    assert!(!texts.iter().any(|t| t.contains("Blue mug")));

    let first_total = texts.iter().position(|t| *t == "Order Total $28.34").unwrap();
    let last_total = texts.iter().rposition(|t| *t == "Order Total $28.34").unwrap();
    assert!(first_total < last_total, "sticky duplicate is kept by the scanner");
}

#[test]
fn every_candidate_selector_resolves_to_its_own_node() {
    let doc = HtmlDocument::parse(CHECKOUT);
    let scanned = CandidateScanner::default().scan_nodes(&doc);
    assert!(!scanned.is_empty());

    for (node, candidate) in &scanned {
        let resolved = resolve_selector(&doc, &candidate.locator)
            .unwrap_or_else(|| panic!("selector {} did not resolve", candidate.locator));
        assert_eq!(resolved, *node, "selector {} hit another node", candidate.locator);
    }
}

#[test]
fn same_text_siblings_resolve_to_distinct_nodes() {
    let doc = HtmlDocument::parse(
        r#"<body><div class="line">Order Total $9.00</div><div class="line">Order Total $9.00</div></body>"#,
    );
    let scanned = CandidateScanner::default().scan_nodes(&doc);
    assert_eq!(scanned.len(), 2);
    assert_ne!(scanned[0].1.locator, scanned[1].1.locator);
    for (node, candidate) in &scanned {
        assert_eq!(resolve_selector(&doc, &candidate.locator), Some(*node));
    }
}

#[test]
fn sticky_summary_is_anchored_by_id() {
    let doc = HtmlDocument::parse(CHECKOUT);
    let candidates = CandidateScanner::default().scan(&doc);
    let sticky = candidates
        .iter()
        .find(|c| c.tag == "p")
        .expect("sticky paragraph candidate");
    assert_eq!(sticky.locator.path, "aside#sticky > p");
    assert_eq!(
        extract_amount(&sticky.text, &PriceBounds::default()),
        Some(28.34)
    );
}
