use ferromacro_core::IndicatorService;

use super::{IndicatorRow, Report};

pub fn run(service: &IndicatorService) -> Report {
    let indicators = service
        .indicators()
        .map(|definition| IndicatorRow {
            name: definition.name.clone(),
            source: definition.source_kind.as_str(),
            source_label: definition.source_kind.provider_label(),
            code: definition.provider_code.clone(),
            unit: definition.unit.clone(),
        })
        .collect();

    Report::Indicators { indicators }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_registry_in_order() {
        let service = IndicatorService::builder().build().expect("valid service");

        let Report::Indicators { indicators } = run(&service) else {
            panic!("expected indicator listing");
        };

        let names = indicators.iter().map(|row| row.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names[0], "Ibovespa");
        assert_eq!(names.len(), 6);
        assert_eq!(indicators[0].source, "yahoo");
        assert_eq!(indicators[2].source_label, "Banco Central do Brasil");
    }
}
