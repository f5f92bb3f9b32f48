use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use excelframe::columns::ColumnSpec;
use excelframe::layout::IndexSpec;
use excelframe::types::CellValue;
use excelframe::{row, DtypeMap, Dtype, ExcelReader, MemoryWorkbook, ReadOptions};

fn workbook(size: usize) -> MemoryWorkbook {
    let mut rows = Vec::with_capacity(size + 1);
    rows.push(row!["ID", "Name", "Value", "Flag", "Note"]);
    for i in 0..size {
        rows.push(vec![
            CellValue::Number(i as f64),
            CellValue::String(format!("Name_{}", i)),
            CellValue::Number(i as f64 * 1.5),
            CellValue::Bool(i % 2 == 0),
            if i % 7 == 0 {
                CellValue::String("NA".to_string())
            } else {
                CellValue::String(format!("note {}", i))
            },
        ]);
    }
    MemoryWorkbook::new().with_sheet("Sheet1", rows)
}

fn benchmark_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    group.sample_size(10);

    for size in [1000, 5000, 10000].iter() {
        let wb = workbook(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let mut reader = ExcelReader::from_workbook(wb.clone());
                let result = reader.parse(&ReadOptions::new()).unwrap();
                black_box(result);
            });
        });
    }

    group.finish();
}

fn benchmark_parse_selected(c: &mut Criterion) {
    let wb = workbook(5000);
    let options = ReadOptions::new()
        .with_usecols(ColumnSpec::Range("A,C:D".to_string()))
        .with_index_col(IndexSpec::Column(0))
        .with_dtype(DtypeMap::new().with("Value", Dtype::Float32));

    c.bench_function("parse_selected_5000_rows", |b| {
        b.iter(|| {
            let mut reader = ExcelReader::from_workbook(wb.clone());
            black_box(reader.parse(&options).unwrap());
        });
    });
}

criterion_group!(benches, benchmark_parse, benchmark_parse_selected);
criterion_main!(benches);
