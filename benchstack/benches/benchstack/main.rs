use std::path::Path;

fn main() {
    divan::main();
}

#[divan::bench]
#[tokio::main]
async fn render_postgres() -> Vec<u8> {
    let dir = Path::new("tests/benchstack/testdata/postgres");
    let mut out = Vec::new();
    benchstack::render(&dir.join("config.yaml"), &dir.join("manifests"), None, &mut out)
        .await
        .unwrap();
    out
}

#[divan::bench]
#[tokio::main]
async fn render_cassandra() -> Vec<u8> {
    let dir = Path::new("tests/benchstack/testdata/cassandra-render");
    let mut out = Vec::new();
    benchstack::render(&dir.join("config.yaml"), &dir.join("manifests"), None, &mut out)
        .await
        .unwrap();
    out
}
