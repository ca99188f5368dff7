use criterion::{black_box, criterion_group, criterion_main, Criterion};

use examforge_core::editor::{Edit, OptionPatch, TreeEditor};
use examforge_core::ids::IdGenerator;
use examforge_core::model::{QuestionType, SectionKind, Test};

/// A reading test with `parts` parts of `questions` MCQs each.
fn make_test(editor: &TreeEditor, parts: usize, questions: usize) -> Test {
    let mut test = Test::new("bench");
    for _ in 0..parts {
        test = editor.apply(&test, &Edit::AddPart { section: SectionKind::Reading });
        let part_id = test.sections.get(SectionKind::Reading).parts.last().map_or(0, |p| p.id);
        let adds: Vec<Edit> = (0..questions)
            .map(|_| Edit::AddQuestion {
                section: SectionKind::Reading,
                part_id,
                question_type: QuestionType::MultipleChoiceText,
            })
            .collect();
        test = editor.apply_all(&test, &adds);
    }
    test
}

fn bench_apply(c: &mut Criterion) {
    let editor = TreeEditor::with_ids(IdGenerator::starting_at(1));
    let mut group = c.benchmark_group("apply");

    for (parts, questions) in [(2, 10), (8, 25)] {
        let test = make_test(&editor, parts, questions);
        let part = &test.sections.get(SectionKind::Reading).parts[0];
        let edit = Edit::ChangeOption {
            section: SectionKind::Reading,
            part_id: part.id,
            question_id: part.questions[0].id,
            option_id: 2,
            patch: OptionPatch {
                is_correct: Some(true),
                ..Default::default()
            },
        };
        group.bench_function(format!("change_option_{parts}x{questions}"), |b| {
            b.iter(|| editor.apply(black_box(&test), black_box(&edit)))
        });
    }

    let test = make_test(&editor, 2, 10);
    let add = Edit::AddPart {
        section: SectionKind::Listening,
    };
    group.bench_function("add_part", |b| {
        b.iter(|| editor.apply(black_box(&test), black_box(&add)))
    });

    group.finish();
}

criterion_group!(benches, bench_apply);
criterion_main!(benches);
