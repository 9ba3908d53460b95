use std::path::{Path, PathBuf};

use reviewpress_core::index;
use reviewpress_core::pipeline::{GenerateConfig, IndexOutcome, generate};
use reviewpress_shared::{ReviewPressError, SiteConfig, Slug};
use scraper::{Html, Selector};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../../fixtures/articles")
        .join(name)
}

fn config(input: PathBuf, images_root: &Path, out: &Path) -> GenerateConfig {
    GenerateConfig {
        input,
        images_root: images_root.to_path_buf(),
        out_dir: out.to_path_buf(),
        update_index: true,
        rebuild_index: false,
        site: SiteConfig {
            title: "Reviews".into(),
            image_base_url: "/images/".into(),
            ..SiteConfig::default()
        },
    }
}

fn img_count(html_path: &Path) -> usize {
    let html = std::fs::read_to_string(html_path).unwrap();
    let doc = Html::parse_document(&html);
    let selector = Selector::parse("img").unwrap();
    doc.select(&selector).count()
}

fn img_srcs(html_path: &Path) -> Vec<String> {
    let html = std::fs::read_to_string(html_path).unwrap();
    let doc = Html::parse_document(&html);
    let selector = Selector::parse("img").unwrap();
    doc.select(&selector)
        .filter_map(|el| el.value().attr("src").map(String::from))
        .collect()
}

fn touch(root: &Path, relative: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, b"\xff\xd8\xff").unwrap();
}

#[test]
fn reviews_without_images_render_no_img_tags() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("site");

    let report = generate(&config(fixture("a.yaml"), tmp.path(), &out)).unwrap();

    assert_eq!(img_count(&report.article.path), 0);
    assert!(report.missing_images.is_empty());
}

#[test]
fn only_missing_images_still_succeeds() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("site");

    let report = generate(&config(fixture("product-x-review.yaml"), tmp.path(), &out)).unwrap();

    assert!(!report.is_partial());
    assert_eq!(img_count(&report.article.path), 0);
    assert_eq!(
        report.missing_images,
        ["product-x/hero.jpg", "product-x/alice-1.jpg"]
    );
    assert_eq!(img_count(&out.join("index.html")), 0);
}

#[test]
fn present_images_use_the_base_url() {
    let tmp = tempfile::tempdir().unwrap();
    let images = tmp.path().join("images");
    touch(&images, "product-x/hero.jpg");
    touch(&images, "product-x/alice-1.jpg");
    touch(&images, "product-x/gallery/01.jpg");
    touch(&images, "product-x/gallery/02.png");
    std::fs::write(images.join("product-x/gallery/notes.txt"), "skip me").unwrap();
    let out = tmp.path().join("site");

    let report = generate(&config(fixture("product-x-review.yaml"), &images, &out)).unwrap();

    assert!(report.missing_images.is_empty());
    let srcs = img_srcs(&report.article.path);
    assert!(srcs.contains(&"/images/product-x/hero.jpg".to_string()));
    assert!(srcs.contains(&"/images/product-x/alice-1.jpg".to_string()));
    assert!(srcs.contains(&"/images/product-x/gallery/01.jpg".to_string()));
    assert!(srcs.contains(&"/images/product-x/gallery/02.png".to_string()));
    assert_eq!(srcs.len(), 4);

    let index_srcs = img_srcs(&out.join("index.html"));
    assert_eq!(index_srcs, ["/images/product-x/hero.jpg"]);
}

#[test]
fn product_x_aggregate_is_recorded_in_the_index() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("site");

    generate(&config(fixture("product-x-review.yaml"), tmp.path(), &out)).unwrap();

    let state = index::load_index(&out).unwrap();
    let entry = state.get(&Slug::parse("product-x-review").unwrap()).unwrap();
    assert!((entry.rating.mean - 4.25).abs() < 1e-9);
    assert_eq!(entry.rating.count, 2);
    assert_eq!(
        entry.rating.distribution,
        std::collections::BTreeMap::from([(4, 1), (5, 1)])
    );

    let page = std::fs::read_to_string(out.join("product-x-review.html")).unwrap();
    assert!(page.contains("4.3"));
}

#[test]
fn json_and_yaml_documents_agree() {
    let tmp = tempfile::tempdir().unwrap();
    let yaml_out = tmp.path().join("yaml");
    let json_out = tmp.path().join("json");

    generate(&config(fixture("product-x-review.yaml"), tmp.path(), &yaml_out)).unwrap();
    generate(&config(fixture("product-x-review.json"), tmp.path(), &json_out)).unwrap();

    let slug = Slug::parse("product-x-review").unwrap();
    let from_yaml = index::load_index(&yaml_out).unwrap();
    let from_json = index::load_index(&json_out).unwrap();
    assert_eq!(
        from_yaml.get(&slug).unwrap().rating,
        from_json.get(&slug).unwrap().rating
    );
}

#[test]
fn runs_accumulate_newest_first() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("site");

    generate(&config(fixture("a.yaml"), tmp.path(), &out)).unwrap();
    let report = generate(&config(fixture("b.yaml"), tmp.path(), &out)).unwrap();

    match report.index {
        IndexOutcome::Updated { entries, .. } => assert_eq!(entries, 2),
        other => panic!("expected index update, got {other:?}"),
    }

    let state = index::load_index(&out).unwrap();
    let slugs: Vec<&str> = state.entries.iter().map(|e| e.slug.as_str()).collect();
    assert_eq!(slugs, ["b", "a"]);

    let html = std::fs::read_to_string(out.join("index.html")).unwrap();
    let b_at = html.find("b.html").unwrap();
    let a_at = html.find("a.html").unwrap();
    assert!(b_at < a_at);
}

#[test]
fn rerun_with_new_rating_replaces_the_entry() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("site");
    let input = tmp.path().join("a.yaml");

    std::fs::copy(fixture("a.yaml"), &input).unwrap();
    generate(&config(input.clone(), tmp.path(), &out)).unwrap();

    let updated = std::fs::read_to_string(&input)
        .unwrap()
        .replace("rating: 3", "rating: 1.5");
    std::fs::write(&input, updated).unwrap();
    generate(&config(input, tmp.path(), &out)).unwrap();

    let state = index::load_index(&out).unwrap();
    assert_eq!(state.len(), 1);
    assert_eq!(state.entries[0].rating.mean, 1.5);
}

#[test]
fn corrupt_index_leaves_article_written() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("site");
    std::fs::create_dir_all(&out).unwrap();
    std::fs::write(out.join("index.json"), "[1, 2,").unwrap();

    let report = generate(&config(fixture("a.yaml"), tmp.path(), &out)).unwrap();

    assert!(report.is_partial());
    match &report.index {
        IndexOutcome::Failed(ReviewPressError::CorruptIndexState { .. }) => {}
        other => panic!("expected corrupt index failure, got {other:?}"),
    }
    assert!(out.join("a.html").is_file());
    assert!(!out.join("index.html").exists());
}

#[test]
fn validation_failure_creates_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("site");

    let err = generate(&config(fixture("missing-slug.yaml"), tmp.path(), &out)).unwrap_err();

    assert!(err.to_string().contains("slug"));
    assert!(!out.exists());
}

#[test]
fn without_index_flag_the_index_is_untouched() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("site");
    std::fs::create_dir_all(&out).unwrap();
    std::fs::write(out.join("index.json"), "left alone").unwrap();

    let mut cfg = config(fixture("a.yaml"), tmp.path(), &out);
    cfg.update_index = false;
    let report = generate(&cfg).unwrap();

    assert!(matches!(report.index, IndexOutcome::Skipped));
    assert_eq!(
        std::fs::read_to_string(out.join("index.json")).unwrap(),
        "left alone"
    );
}

#[test]
fn stylesheet_is_inlined() {
    let tmp = tempfile::tempdir().unwrap();
    let assets = tmp.path().join("assets");
    std::fs::create_dir_all(&assets).unwrap();
    std::fs::write(assets.join("styles.css"), "body { color: rebeccapurple; }").unwrap();
    let out = tmp.path().join("site");

    let mut cfg = config(fixture("a.yaml"), tmp.path(), &out);
    cfg.site.assets_dir = Some(assets);
    let report = generate(&cfg).unwrap();

    let page = std::fs::read_to_string(&report.article.path).unwrap();
    assert!(page.contains("rebeccapurple"));
    let index = std::fs::read_to_string(out.join("index.html")).unwrap();
    assert!(index.contains("rebeccapurple"));
}
