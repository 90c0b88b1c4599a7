use crate::output::{print_json, print_table};
use standsim_core::metrics::MetricField;

pub fn run(json: bool) -> anyhow::Result<()> {
    if json {
        let fields: Vec<_> = MetricField::all()
            .iter()
            .map(|f| serde_json::json!({ "name": f.display_name(), "code": f.code() }))
            .collect();
        return print_json(&fields);
    }

    let rows = MetricField::all()
        .iter()
        .map(|f| vec![f.display_name().to_string(), f.code().to_string()])
        .collect();
    print_table(&["FIELD", "CODE"], rows);
    Ok(())
}
