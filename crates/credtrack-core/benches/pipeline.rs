use criterion::{black_box, criterion_group, criterion_main, Criterion};

use credtrack_core::aggregate::CreditCaps;
use credtrack_core::engine::summarize_sources;
use credtrack_core::grading::grade;
use credtrack_core::model::*;
use credtrack_core::reader::StudentSources;
use credtrack_core::terms::{decompose_terms, FullYearPolicy};

fn make_sources(subjects: i64) -> StudentSources {
    let student = StudentId(1);
    let terms = ["Term 1", "Term 2", "Full Year"];
    StudentSources {
        enrollments: (0..subjects)
            .map(|i| Enrollment {
                student_id: student,
                subject_id: SubjectId(i),
                credits_earned: Some((i % 10) as u32),
                term: Some(terms[(i % 3) as usize].to_string()),
                subject: Some(Subject {
                    id: SubjectId(i),
                    name: None,
                    credit_value: Some(10),
                    kind: Some("core".into()),
                }),
            })
            .collect(),
        work_experience: vec![WorkExperience {
            student_id: student,
            credits_earned: Some(15),
        }],
        portfolio: vec![Portfolio {
            student_id: student,
            academic_year_id: Some(AcademicYearId(1)),
            period: Some("Term 1".into()),
            credits_earned: Some(18),
        }],
        attendance: vec![
            Attendance {
                student_id: student,
                period: Some("Term 1".into()),
                credits_earned: Some(9),
            },
            Attendance {
                student_id: student,
                period: Some("Term 2".into()),
                credits_earned: Some(10),
            },
        ],
        exemptions: (0..subjects)
            .step_by(7)
            .map(|i| Exemption {
                student_id: student,
                subject_id: SubjectId(i),
            })
            .collect(),
    }
}

fn bench_summary(c: &mut Criterion) {
    let mut group = c.benchmark_group("summarize_sources");
    let caps = CreditCaps::default();

    for subjects in [8, 64, 512] {
        let sources = make_sources(subjects);
        group.bench_function(format!("subjects={subjects}"), |b| {
            b.iter(|| summarize_sources(black_box(&sources), black_box(&caps)))
        });
    }

    group.finish();
}

fn bench_terms(c: &mut Criterion) {
    let mut group = c.benchmark_group("decompose_terms");
    let sources = make_sources(64);

    group.bench_function("all_categories", |b| {
        b.iter(|| {
            decompose_terms(
                black_box(&sources.enrollments),
                black_box(&sources.portfolio),
                black_box(&sources.attendance),
                FullYearPolicy::AllCategories,
            )
        })
    });

    group.finish();
}

fn bench_grade(c: &mut Criterion) {
    c.bench_function("grade", |b| b.iter(|| grade(black_box(317), black_box(412))));
}

criterion_group!(benches, bench_summary, bench_terms, bench_grade);
criterion_main!(benches);
