use std::collections::HashMap;

/// Copy every entry of `maps` into `source`, later maps overwriting earlier keys.
pub fn merge_maps(
    source: &mut HashMap<String, String>,
    maps: &[&HashMap<String, String>],
) {
    for map in maps {
        for (key, value) in map.iter() {
            source.insert(key.clone(), value.clone());
        }
    }
}

/// Merge `maps` into a fresh map; on conflict the last map wins.
pub fn merged_maps(maps: &[&HashMap<String, String>]) -> HashMap<String, String> {
    let mut merged = HashMap::new();
    merge_maps(&mut merged, maps);
    merged
}
