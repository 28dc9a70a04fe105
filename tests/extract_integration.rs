mod common;

use common::write_pdf;
use tempfile::TempDir;
use vault_core::error::ExtractError;
use vault_core::extract::extract;

#[tokio::test]
async fn text_and_markdown_are_read_verbatim() {
    let tmp = TempDir::new().unwrap();
    let md = tmp.path().join("a.md");
    let txt = tmp.path().join("b.TXT");
    std::fs::write(&md, "# Title\n\nalpha beta ünïcode").unwrap();
    std::fs::write(&txt, "plain").unwrap();

    assert_eq!(extract(&md).await.unwrap(), "# Title\n\nalpha beta ünïcode");
    assert_eq!(extract(&txt).await.unwrap(), "plain");
}

#[tokio::test]
async fn text_read_failures_propagate() {
    let tmp = TempDir::new().unwrap();
    let binary = tmp.path().join("bin.md");
    std::fs::write(&binary, [0xc3u8, 0x28, 0xff]).unwrap();

    assert!(matches!(extract(&binary).await, Err(ExtractError::Read { .. })));
    assert!(matches!(
        extract(&tmp.path().join("missing.txt")).await,
        Err(ExtractError::Read { .. })
    ));
}

#[tokio::test]
async fn pdf_pages_are_joined_with_newlines() {
    let tmp = TempDir::new().unwrap();
    let pdf = tmp.path().join("doc.pdf");
    write_pdf(&pdf, &["gamma first", "delta second"]);

    let text = extract(&pdf).await.unwrap();
    let gamma = text.find("gamma").expect("first page text");
    let delta = text.find("delta").expect("second page text");
    assert!(gamma < delta);
    assert!(text[gamma..delta].contains('\n'));
    assert!(text.ends_with('\n'));
}

#[tokio::test]
async fn corrupt_pdf_degrades_to_empty_text() {
    let tmp = TempDir::new().unwrap();
    let pdf = tmp.path().join("broken.pdf");
    std::fs::write(&pdf, "this is not a pdf at all").unwrap();

    assert_eq!(extract(&pdf).await.unwrap(), "");
    assert_eq!(extract(&tmp.path().join("missing.pdf")).await.unwrap(), "");
}
