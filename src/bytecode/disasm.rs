use crate::bytecode::{Op, Pcode};

/// Print a pcode listing with instruction indices and branch-target markers.
pub fn print_pcode(pcode: &Pcode) {
    let targets = collect_branch_targets(&pcode.ops);

    println!("{} instructions", pcode.ops.len());
    for (index, op) in pcode.ops.iter().enumerate() {
        if targets.contains(&index) {
            println!("{:04} ► {}", index, op);
        } else {
            println!("{:04}   {}", index, op);
        }
    }
}

fn collect_branch_targets(ops: &[Op]) -> Vec<usize> {
    let mut targets = Vec::new();

    for op in ops {
        if let Some(target) = op.branch_target() {
            if !targets.contains(&target) {
                targets.push(target);
            }
        }
    }

    targets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_branch_targets() {
        let ops = vec![
            Op::Int(1),
            Op::Lda(0),
            Op::Inn,
            Op::Ldi(0),
            Op::Eql,
            Op::Bze(1),
            Op::Brn(1),
            Op::Hlt,
        ];
        assert_eq!(collect_branch_targets(&ops), vec![1]);
    }
}
