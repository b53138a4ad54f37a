//! State-transition tests in the `SingleStepTests` JSON format.
//!
//! A small hand-checked fixture ships in `tests/data/`. The full suite
//! (256 unprefixed + 256 CB files × 1,000 cases) lives in `test-data/sm83/v1/`
//! and is run with `--ignored`.

use emu_core::{Bus, Cpu, SimpleBus};
use serde::Deserialize;
use sharp_sm83::{MCYCLE, Registers, Sm83};
use std::fs;
use std::panic;
use std::path::Path;

const IE: u16 = 0xFFFF;

/// JSON test case format.
#[derive(Deserialize)]
struct TestCase {
    name: String,
    initial: CpuState,
    #[serde(rename = "final")]
    final_state: CpuState,
    cycles: Vec<serde_json::Value>,
}

/// JSON CPU state format.
#[derive(Deserialize)]
struct CpuState {
    pc: u16,
    sp: u16,
    a: u8,
    b: u8,
    c: u8,
    d: u8,
    e: u8,
    f: u8,
    h: u8,
    l: u8,
    ime: u8,
    #[serde(default)]
    ie: Option<u8>,
    ram: Vec<(u16, u8)>,
}

fn setup(cpu: &mut Sm83, bus: &mut SimpleBus, state: &CpuState) {
    for &(addr, value) in &state.ram {
        bus.load(addr, &[value]);
    }
    if let Some(ie) = state.ie {
        bus.load(IE, &[ie]);
    }

    cpu.reset_to(Registers {
        a: state.a,
        f: state.f,
        b: state.b,
        c: state.c,
        d: state.d,
        e: state.e,
        h: state.h,
        l: state.l,
        sp: state.sp,
        pc: state.pc,
    });
    cpu.set_ime(state.ime != 0);
}

/// Compare the CPU/bus state against expected, returning a list of mismatches.
fn compare(cpu: &Sm83, bus: &SimpleBus, expected: &CpuState) -> Vec<String> {
    let mut errors = Vec::new();
    let regs = cpu.registers();

    check_u8(&mut errors, "A", regs.a, expected.a);
    check_u8(&mut errors, "F", regs.f, expected.f);
    check_u8(&mut errors, "B", regs.b, expected.b);
    check_u8(&mut errors, "C", regs.c, expected.c);
    check_u8(&mut errors, "D", regs.d, expected.d);
    check_u8(&mut errors, "E", regs.e, expected.e);
    check_u8(&mut errors, "H", regs.h, expected.h);
    check_u8(&mut errors, "L", regs.l, expected.l);
    check_u16(&mut errors, "SP", regs.sp, expected.sp);
    check_u16(&mut errors, "PC", cpu.pc(), expected.pc);

    // EI only arms IME for the next step; the suite records the committed value.
    let actual_ime = u8::from(cpu.ime());
    if actual_ime != expected.ime {
        errors.push(format!("IME: got {actual_ime}, want {}", expected.ime));
    }

    for &(addr, expected_val) in &expected.ram {
        let actual_val = bus.peek(addr);
        if actual_val != expected_val {
            errors.push(format!(
                "RAM[${addr:04X}]: got ${actual_val:02X}, want ${expected_val:02X}"
            ));
        }
    }

    errors
}

fn check_u8(errors: &mut Vec<String>, name: &str, actual: u8, expected: u8) {
    if actual != expected {
        errors.push(format!("{name}: got ${actual:02X}, want ${expected:02X}"));
    }
}

fn check_u16(errors: &mut Vec<String>, name: &str, actual: u16, expected: u16) {
    if actual != expected {
        errors.push(format!("{name}: got ${actual:04X}, want ${expected:04X}"));
    }
}

/// Run one case, returning mismatches including the cycle count.
fn run_case(test: &TestCase) -> Vec<String> {
    let mut cpu = Sm83::new();
    let mut bus = SimpleBus::new();
    setup(&mut cpu, &mut bus, &test.initial);

    cpu.step(&mut bus);

    let mut errors = compare(&cpu, &bus, &test.final_state);
    let want = test.cycles.len() as u64 * u64::from(MCYCLE);
    if cpu.clock().get() != want {
        errors.push(format!("cycles: got {}, want {want}", cpu.clock().get()));
    }
    if bus.cycles() != want {
        errors.push(format!("bus cycles: got {}, want {want}", bus.cycles()));
    }
    errors
}

#[test]
fn bundled_cases() {
    let tests: Vec<TestCase> =
        serde_json::from_str(include_str!("data/sm83_cases.json")).expect("fixture parses");
    assert!(!tests.is_empty());

    let failures: Vec<String> = tests
        .iter()
        .filter_map(|test| {
            let errors = run_case(test);
            (!errors.is_empty()).then(|| format!("[{}]: {}", test.name, errors.join(", ")))
        })
        .collect();

    assert!(failures.is_empty(), "{}", failures.join("\n"));
}

/// Run every SM83 `SingleStepTests` file found under `test-data/sm83/v1/`.
#[test]
#[ignore = "requires test-data/sm83 — run with --ignored"]
fn run_all() {
    let test_dir = Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("parent of crate dir")
        .parent()
        .expect("workspace root")
        .join("test-data/sm83/v1");

    if !test_dir.exists() {
        eprintln!("Test data not found at {}", test_dir.display());
        eprintln!("Skipping SingleStepTests.");
        return;
    }

    let mut filenames: Vec<String> = Vec::new();
    for opcode in 0..=0xFFu8 {
        if opcode == 0xCB {
            continue;
        }
        filenames.push(format!("{opcode:02x}.json"));
    }
    for opcode in 0..=0xFFu8 {
        filenames.push(format!("cb {opcode:02x}.json"));
    }

    let mut total_pass = 0u64;
    let mut total_fail = 0u64;
    let mut total_files = 0u32;

    for filename in &filenames {
        let path = test_dir.join(filename);
        if !path.exists() {
            continue;
        }

        let data = fs::read_to_string(&path).unwrap_or_else(|e| {
            panic!("Failed to read {}: {e}", path.display());
        });
        let tests: Vec<TestCase> = serde_json::from_str(&data).unwrap_or_else(|e| {
            panic!("Failed to parse {}: {e}", path.display());
        });

        let mut file_pass = 0u32;
        let mut file_fail = 0u32;
        let mut first_failures: Vec<String> = Vec::new();

        for test in &tests {
            let result = panic::catch_unwind(panic::AssertUnwindSafe(|| run_case(test)));

            match result {
                Ok(errors) if errors.is_empty() => file_pass += 1,
                Ok(errors) => {
                    file_fail += 1;
                    if first_failures.len() < 5 {
                        first_failures.push(format!(
                            "  FAIL [{}]: {}",
                            test.name,
                            errors.join(", ")
                        ));
                    }
                }
                Err(_) => {
                    file_fail += 1;
                    if first_failures.len() < 5 {
                        first_failures.push(format!("  PANIC [{}]", test.name));
                    }
                }
            }
        }

        let status = if file_fail == 0 { "PASS" } else { "FAIL" };
        println!(
            "{filename}: {status} — {file_pass}/{} passed",
            file_pass + file_fail
        );
        for msg in &first_failures {
            println!("{msg}");
        }

        total_pass += u64::from(file_pass);
        total_fail += u64::from(file_fail);
        total_files += 1;
    }

    println!();
    println!("=== SM83 SingleStepTests Summary ===");
    println!(
        "Files: {total_files}, Total: {}, Pass: {total_pass}, Fail: {total_fail}",
        total_pass + total_fail
    );

    assert_eq!(total_fail, 0, "{total_fail} tests failed");
}
