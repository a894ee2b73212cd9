use bam_mergeref::header::merge_read_groups;
use bam_mergeref::provenance::{self, previous_program_id, program_id, PROGRAM_ID};
use bam_mergeref::{HeaderLineGroups, HeaderMerger, MergeError};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn merger() -> HeaderMerger {
    HeaderMerger {
        ref1_name: "A".into(),
        ref2_name: "B".into(),
        command_line: "bam-mergeref -a A -b B in1.bam in2.bam out.bam".into(),
    }
}

fn lines(text: &[&str]) -> Vec<String> {
    text.iter().map(|s| s.to_string()).collect()
}

fn merge_error(first: &str, second: &str) -> MergeError {
    let mut rng = StdRng::seed_from_u64(1);
    let err = merger()
        .merge_text(first, second, &mut rng)
        .expect_err("merge should fail");
    err.downcast_ref::<MergeError>()
        .cloned()
        .unwrap_or_else(|| panic!("unexpected error: {err:#}"))
}

fn is_suffixed(id: &str, base: &str) -> bool {
    id.strip_prefix(base)
        .and_then(|rest| rest.strip_prefix('-'))
        .is_some_and(|suffix| {
            suffix.len() == 8
                && suffix
                    .bytes()
                    .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
        })
}

// ── line groups ──────────────────────────────────────────────────────────────

#[test]
fn parse_splits_lines_by_record_type() {
    let text = "@HD\tVN:1.6\tSO:queryname\n\
                @SQ\tSN:chr1\tLN:100\n\
                @RG\tID:g1\n\
                @PG\tID:bwa\tPN:bwa\n\
                @CO\tfree text\n";
    let groups = HeaderLineGroups::parse(text).unwrap();

    assert_eq!(groups.hd.as_deref(), Some("@HD\tVN:1.6\tSO:queryname"));
    assert_eq!(groups.sq, lines(&["@SQ\tSN:chr1\tLN:100"]));
    assert_eq!(groups.rg, lines(&["@RG\tID:g1"]));
    assert_eq!(groups.pg, lines(&["@PG\tID:bwa\tPN:bwa"]));
    assert_eq!(groups.co, lines(&["@CO\tfree text"]));
}

#[test]
fn unknown_header_tag_is_a_format_error() {
    let err = merge_error("@XX\tfoo:bar\n", "");
    assert!(matches!(err, MergeError::Format(_)));
}

#[test]
fn second_hd_line_is_a_format_error() {
    let err = merge_error("@HD\tVN:1.6\n@HD\tVN:1.6\n", "@HD\tVN:1.6\n");
    assert!(matches!(err, MergeError::Format(_)));
}

#[test]
fn differing_hd_lines_are_rejected() {
    let err = merge_error("@HD\tVN:1.6\tSO:queryname\n", "@HD\tVN:1.5\tSO:queryname\n");
    match err {
        MergeError::HeaderMismatch { first, second } => {
            assert_eq!(first, "@HD\tVN:1.6\tSO:queryname");
            assert_eq!(second, "@HD\tVN:1.5\tSO:queryname");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn hd_present_in_one_input_only_is_rejected() {
    let err = merge_error("@HD\tVN:1.6\n", "@SQ\tSN:chr1\tLN:100\n");
    assert!(matches!(err, MergeError::HeaderMismatch { .. }));
}

// ── @SQ ──────────────────────────────────────────────────────────────────────

#[test]
fn shared_sequence_gets_both_synthetic_names() {
    let merged = merger()
        .merge_reference_sequences(
            &lines(&["@SQ\tSN:chr1\tLN:100"]),
            &lines(&["@SQ\tSN:chr1\tLN:100", "@SQ\tSN:chr2\tLN:50"]),
        )
        .unwrap();

    assert_eq!(
        merged,
        lines(&[
            "@SQ\tSN:chr1\tLN:100\tAN:chr1-A-1,chr1-B-2",
            "@SQ\tSN:chr2\tLN:50\tAN:chr2-B-2",
        ])
    );
}

#[test]
fn existing_alternate_names_are_extended() {
    let merged = merger()
        .merge_reference_sequences(
            &lines(&["@SQ\tSN:chr1\tLN:100\tAN:foo,bar\tUR:file.fa"]),
            &lines(&["@SQ\tSN:chr1\tLN:100"]),
        )
        .unwrap();

    assert_eq!(
        merged,
        lines(&["@SQ\tSN:chr1\tLN:100\tAN:foo,bar,chr1-A-1,chr1-B-2\tUR:file.fa"])
    );
}

#[test]
fn sequences_are_joined_in_natural_order() {
    let merged = merger()
        .merge_reference_sequences(
            &lines(&["@SQ\tSN:chr2\tLN:1", "@SQ\tSN:chr10\tLN:1"]),
            &lines(&["@SQ\tSN:chr1\tLN:1", "@SQ\tSN:chr10\tLN:1", "@SQ\tSN:chrM\tLN:1"]),
        )
        .unwrap();

    assert_eq!(
        merged,
        lines(&[
            "@SQ\tSN:chr1\tLN:1\tAN:chr1-B-2",
            "@SQ\tSN:chr2\tLN:1\tAN:chr2-A-1",
            "@SQ\tSN:chr10\tLN:1\tAN:chr10-A-1,chr10-B-2",
            "@SQ\tSN:chrM\tLN:1\tAN:chrM-B-2",
        ])
    );
}

#[test]
fn missing_sequence_name_names_the_input() {
    let cases = [
        (vec!["@SQ\tLN:1"], vec!["@SQ\tSN:chr1\tLN:1"], "input file 1"),
        (vec!["@SQ\tSN:chr1\tLN:1"], vec!["@SQ\tLN:1"], "input file 2"),
        (vec!["@SQ\tLN:1"], vec!["@SQ\tLN:1"], "both input files"),
        (vec![], vec!["@SQ\tLN:1"], "input file 2"),
    ];

    for (first, second, location) in cases {
        let err = merger()
            .merge_reference_sequences(&lines(&first), &lines(&second))
            .unwrap_err();
        match err.downcast_ref::<MergeError>() {
            Some(MergeError::Format(msg)) => assert!(msg.contains(location), "{msg}"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

// ── @RG / @CO ────────────────────────────────────────────────────────────────

#[test]
fn read_groups_are_sorted_and_deduplicated() {
    let merged = merge_read_groups(
        &lines(&["@RG\tID:b\tSM:x", "@RG\tID:a\tSM:x"]),
        &lines(&["@RG\tID:a\tSM:x", "@RG\tID:a\tSM:y"]),
    );
    assert_eq!(
        merged,
        lines(&["@RG\tID:a\tSM:x", "@RG\tID:a\tSM:y", "@RG\tID:b\tSM:x"])
    );
}

// ── @PG ──────────────────────────────────────────────────────────────────────

#[test]
fn new_program_line_heads_the_chain() {
    let mut rng = StdRng::seed_from_u64(1);
    let pg = provenance::merge_programs(
        &lines(&["@PG\tID:bwa\tPN:bwa"]),
        &lines(&["@PG\tID:minimap2\tPN:minimap2"]),
        "bam-mergeref x y z",
        &mut rng,
    )
    .unwrap();

    assert_eq!(
        pg,
        lines(&[
            "@PG\tID:bam-mergeref\tPN:bam-mergeref\tPP:bwa\tCL:bam-mergeref x y z",
            "@PG\tID:bwa\tPN:bwa",
            "@PG\tID:minimap2\tPN:minimap2",
        ])
    );
}

#[test]
fn empty_first_chain_leaves_new_line_without_pp() {
    let mut rng = StdRng::seed_from_u64(1);
    let pg = provenance::merge_programs(&[], &[], "cmd", &mut rng).unwrap();
    assert_eq!(pg, lines(&["@PG\tID:bam-mergeref\tPN:bam-mergeref\tCL:cmd"]));
}

#[test]
fn colliding_ids_are_renamed_and_repointed() {
    let mut rng = StdRng::seed_from_u64(9);
    let pg = provenance::merge_programs(
        &lines(&[
            "@PG\tID:samtools\tPN:samtools\tPP:bwa",
            "@PG\tID:bwa\tPN:bwa",
        ]),
        &lines(&["@PG\tID:bwa\tPN:bwa\tVN:0.7"]),
        "cmd",
        &mut rng,
    )
    .unwrap();

    assert_eq!(pg.len(), 4);

    // Non-colliding ID stays, and its PP follows the rename.
    assert_eq!(program_id(&pg[1]).unwrap(), "samtools");
    let renamed = program_id(&pg[2]).unwrap();
    assert!(is_suffixed(renamed, "bwa"), "{renamed}");
    assert_eq!(previous_program_id(&pg[1]), Some(renamed));

    // The new line points at the head of input 1's chain.
    assert_eq!(program_id(&pg[0]).unwrap(), PROGRAM_ID);
    assert_eq!(previous_program_id(&pg[0]), Some("samtools"));

    // Input 2's chain is untouched.
    assert_eq!(pg[3], "@PG\tID:bwa\tPN:bwa\tVN:0.7");
}

#[test]
fn new_program_line_points_at_renamed_head() {
    let mut rng = StdRng::seed_from_u64(2);
    let pg = provenance::merge_programs(
        &lines(&["@PG\tID:bwa\tPN:bwa"]),
        &lines(&["@PG\tID:bwa\tPN:bwa"]),
        "cmd",
        &mut rng,
    )
    .unwrap();

    let renamed = program_id(&pg[1]).unwrap();
    assert!(is_suffixed(renamed, "bwa"), "{renamed}");
    assert_eq!(previous_program_id(&pg[0]), Some(renamed));
}

#[test]
fn reserved_id_in_use_gets_a_suffix() {
    let mut rng = StdRng::seed_from_u64(3);
    let pg = provenance::merge_programs(
        &[],
        &lines(&["@PG\tID:bam-mergeref\tPN:bam-mergeref\tCL:earlier run"]),
        "cmd",
        &mut rng,
    )
    .unwrap();

    let id = program_id(&pg[0]).unwrap();
    assert!(is_suffixed(id, PROGRAM_ID), "{id}");
    assert_eq!(program_id(&pg[1]).unwrap(), PROGRAM_ID);
}

#[test]
fn program_line_without_id_is_a_format_error() {
    let err = merge_error("@PG\tPN:bwa\n", "");
    assert!(matches!(err, MergeError::Format(_)));
}

// ── whole header ─────────────────────────────────────────────────────────────

#[test]
fn merged_text_keeps_section_order() {
    let first = "@HD\tVN:1.6\tSO:queryname\n\
                 @SQ\tSN:chr1\tLN:100\n\
                 @RG\tID:g1\n\
                 @PG\tID:bwa\tPN:bwa\n\
                 @CO\tfirst\n";
    let second = "@CO\tsecond\n\
                  @PG\tID:hisat2\tPN:hisat2\n\
                  @HD\tVN:1.6\tSO:queryname\n\
                  @SQ\tSN:chr1\tLN:100\n";

    let mut rng = StdRng::seed_from_u64(1);
    let text = merger().merge_text(first, second, &mut rng).unwrap();
    let tags: Vec<&str> = text.lines().map(|line| &line[..3]).collect();

    assert_eq!(
        tags,
        vec!["@HD", "@SQ", "@RG", "@PG", "@PG", "@PG", "@CO", "@CO"]
    );
    assert!(text.ends_with('\n'));
    assert!(text.contains("@SQ\tSN:chr1\tLN:100\tAN:chr1-A-1,chr1-B-2\n"));
    assert!(text.contains("\tCL:bam-mergeref -a A -b B in1.bam in2.bam out.bam\n"));

    let co: Vec<&str> = text.lines().filter(|l| l.starts_with("@CO")).collect();
    assert_eq!(co, vec!["@CO\tfirst", "@CO\tsecond"]);
}
