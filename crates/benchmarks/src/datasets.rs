use rand::{distributions::Alphanumeric, rngs::StdRng, Rng, SeedableRng};

const SCHEMA_TEMPLATE: &str =
    "{\"type\":\"object\",\"properties\":{\"name\":{\"type\":\"string\"},\"count\":{\"type\":\"integer\"}}}";

/// Deterministic schema/document pairs of roughly realistic size.
pub fn generate_payloads(count: usize, seed: u64) -> Vec<(String, String)> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|idx| {
            let json = serde_json::json!({
                "name": random_suffix(&mut rng),
                "count": idx,
                "note": random_suffix(&mut rng),
            })
            .to_string();
            (SCHEMA_TEMPLATE.to_string(), json)
        })
        .collect()
}

fn random_suffix(rng: &mut StdRng) -> String {
    (0..32).map(|_| rng.sample(Alphanumeric) as char).collect()
}
