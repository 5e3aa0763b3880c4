// Export OpenAPI specification as JSON
//
// Usage: cargo run --bin export-openapi > docs/openapi.json

use meetbrief_api::openapi::ApiDoc;

fn main() {
    println!("{}", ApiDoc::to_json());
}
