//! `foundry tools` — List the built-in tools.

pub fn run() {
    let catalog = super::registry().catalog();
    let width = catalog.iter().map(|t| t.name.len()).max().unwrap_or(0);
    for item in &catalog {
        println!("{:width$}  {}", item.name, item.description);
    }
}
