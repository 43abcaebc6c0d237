use ssa_split::ir::{BinaryOp, CmpCond};
use ssa_split::{
    enumerate_users, split_basic_block, verify_function, verify_function_with_options, BlockId,
    Function, FunctionBuilder, Inst, Type, Value, VerifierOptions,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn inst_of(func: &Function, value: Value) -> Inst {
    func.value_inst(value).expect("value is an instruction result")
}

/// The single phi at the top of `block`
fn first_phi(func: &Function, block: BlockId) -> Inst {
    let inst = func.first_inst(block).expect("block is not empty");
    assert!(func.is_phi(inst), "expected a phi, got `{}`", func.display_inst(inst));
    inst
}

fn phi_pairs(func: &Function, phi: Inst) -> Vec<(Value, BlockId)> {
    func.inst_kind(phi).phi_incoming().to_vec()
}

#[test]
fn test_round_trip_scenario() {
    init_logging();
    let mut func = Function::new("scenario", &[]);
    let bb = func.create_block("bb");
    let merge = func.create_block("merge");

    let mut b = FunctionBuilder::new(&mut func);
    b.set_insert_point_at_end(bb);
    let one = b.iconst(Type::I32, 1);
    let two = b.iconst(Type::I32, 2);
    let x = b.binary(BinaryOp::Add, one, two, "x");
    let y = b.call("foo", &[], Type::I32, "y");
    let z = b.binary(BinaryOp::Mul, x, x, "z");
    b.set_insert_point_at_end(merge);
    let m = b.phi(Type::I32, Some("m"));
    b.func_mut().add_phi_incoming(m, z, bb);

    let new_block = split_basic_block(&mut b, bb, Some(y), bb, "bb.split");
    let func = b.func();

    let x_inst = inst_of(func, x);
    let z_inst = inst_of(func, z);
    assert_eq!(func.block_insts(bb), vec![x_inst, y]);
    assert_eq!(func.block_insts(new_block), vec![z_inst]);
    assert_eq!(func.layout(), &[bb, new_block, merge]);
    assert_eq!(func.block_name(new_block), "bb.split");

    assert!(!func.is_inst_live(m));
    let replacement = first_phi(func, merge);
    assert_eq!(phi_pairs(func, replacement), vec![(z, new_block)]);
    assert_eq!(func.value_name(func.inst_result(replacement)), Some("m"));
    verify_function_with_options(func, &VerifierOptions::structural()).unwrap();
}

#[test]
fn test_tail_moves_in_order_and_terminator_follows() {
    init_logging();
    let mut func = Function::new("f", &[Type::I32]);
    let entry = func.create_block("entry");
    let exit = func.create_block("exit");
    let p = func.param(0);

    let mut b = FunctionBuilder::new(&mut func);
    b.set_insert_point_at_end(entry);
    let a = b.binary(BinaryOp::Add, p, p, "a");
    let c = b.binary(BinaryOp::Sub, a, p, "c");
    let d = b.binary(BinaryOp::Xor, c, a, "d");
    let jump = b.jump(exit);
    b.set_insert_point_at_end(exit);
    b.ret(Some(d));

    let before = b.func().block_insts(entry);
    let split_point = inst_of(b.func(), a);
    let new_block = split_basic_block(&mut b, entry, Some(split_point), entry, "entry.tail");

    let func = b.func();
    assert_eq!(func.block_insts(entry), before[..1].to_vec());
    assert_eq!(func.block_insts(new_block), before[1..].to_vec());
    assert_eq!(func.terminator(entry), None);
    assert_eq!(func.terminator(new_block), Some(jump));
    for &inst in &before[1..] {
        assert_eq!(func.inst_block(inst), Some(new_block));
    }
    // Operands were not touched by the move.
    assert_eq!(func.inst_kind(inst_of(func, d)).operands(), vec![c, a]);
}

#[test]
fn test_caller_connects_blocks_and_function_verifies() {
    init_logging();
    let mut func = Function::new("f", &[Type::I32]);
    let entry = func.create_block("entry");
    let exit = func.create_block("exit");
    let p = func.param(0);

    let mut b = FunctionBuilder::new(&mut func);
    b.set_insert_point_at_end(entry);
    let a = b.binary(BinaryOp::Add, p, p, "a");
    let c = b.binary(BinaryOp::Mul, a, a, "c");
    b.jump(exit);
    b.set_insert_point_at_end(exit);
    let r = b.phi(Type::I32, Some("r"));
    b.func_mut().add_phi_incoming(r, c, entry);
    let r_value = b.func().inst_result(r);
    b.ret(Some(r_value));

    let split_point = inst_of(b.func(), a);
    let new_block = split_basic_block(&mut b, entry, Some(split_point), entry, "entry.cont");

    // The cursor is left at the end of the original block.
    assert_eq!(b.current_block(), Some(entry));
    b.jump(new_block);

    let func = b.func();
    verify_function(func).unwrap();
    let phi = first_phi(func, exit);
    assert_eq!(phi_pairs(func, phi), vec![(c, new_block)]);
    // The return now reads the replacement phi.
    let ret = func.terminator(exit).unwrap();
    assert_eq!(func.inst_kind(ret).operands(), vec![func.inst_result(phi)]);
}

#[test]
fn test_constants_and_unmoved_values_keep_their_predecessor() {
    init_logging();
    let mut func = Function::new("f", &[Type::I1, Type::I32]);
    let entry = func.create_block("entry");
    let work = func.create_block("work");
    let join = func.create_block("join");
    let (cond, p) = (func.param(0), func.param(1));

    let mut b = FunctionBuilder::new(&mut func);
    b.set_insert_point_at_end(entry);
    let early = b.binary(BinaryOp::Add, p, p, "early");
    b.branch(cond, work, join);
    b.set_insert_point_at_end(work);
    let kept = b.binary(BinaryOp::Mul, p, p, "kept");
    let moved = b.binary(BinaryOp::Sub, kept, p, "moved");
    b.jump(join);
    b.set_insert_point_at_end(join);
    let seven = b.iconst(Type::I32, 7);
    let m1 = b.phi(Type::I32, Some("m1"));
    let m2 = b.phi(Type::I32, Some("m2"));
    b.ret(None);
    let f = b.func_mut();
    f.add_phi_incoming(m1, seven, entry);
    f.add_phi_incoming(m1, moved, work);
    f.add_phi_incoming(m2, early, entry);
    f.add_phi_incoming(m2, kept, work);

    let split_point = inst_of(b.func(), kept);
    let cont = split_basic_block(&mut b, work, Some(split_point), work, "work.cont");
    b.jump(cont);

    let func = b.func();
    // m1 reads a moved value and is rebuilt; m2 reads nothing from the tail.
    assert!(!func.is_inst_live(m1));
    assert!(func.is_inst_live(m2));
    let phis = func.block_insts(join);
    assert_eq!(phi_pairs(func, phis[0]), vec![(seven, entry), (moved, cont)]);
    assert_eq!(phis[1], m2);
    assert_eq!(phi_pairs(func, m2), vec![(early, entry), (kept, work)]);

    // m2 still names `work`, which no longer jumps to `join` directly. That
    // repair belongs to the caller; the structural invariants hold regardless.
    verify_function_with_options(func, &VerifierOptions::structural()).unwrap();
}

#[test]
fn test_phi_fed_by_two_moved_values_is_rebuilt_once() {
    init_logging();
    let mut func = Function::new("f", &[Type::I1, Type::I32]);
    let entry = func.create_block("entry");
    let left = func.create_block("left");
    let right = func.create_block("right");
    let join = func.create_block("join");
    let (cond, p) = (func.param(0), func.param(1));

    let mut b = FunctionBuilder::new(&mut func);
    b.set_insert_point_at_end(entry);
    let head = b.call("prepare", &[], Type::Void, "");
    let z1 = b.binary(BinaryOp::Add, p, p, "z1");
    let z2 = b.binary(BinaryOp::Mul, p, p, "z2");
    b.branch(cond, left, right);
    b.set_insert_point_at_end(left);
    b.jump(join);
    b.set_insert_point_at_end(right);
    b.jump(join);
    b.set_insert_point_at_end(join);
    let m = b.phi(Type::I32, Some("m"));
    let out = b.binary(BinaryOp::Add, p, p, "out");
    b.ret(Some(out));
    b.func_mut().add_phi_incoming(m, z1, left);
    b.func_mut().add_phi_incoming(m, z2, right);
    let m_value = b.func().inst_result(m);
    let out_inst = inst_of(b.func(), out);
    b.func_mut().set_operand(out_inst, 1, m_value);

    let cont = split_basic_block(&mut b, entry, Some(head), entry, "entry.cont");
    b.jump(cont);

    let func = b.func();
    let phis: Vec<_> = func
        .block_insts(join)
        .into_iter()
        .filter(|&inst| func.is_phi(inst))
        .collect();
    assert_eq!(phis.len(), 1);
    assert!(!func.is_inst_live(m));
    assert_eq!(phi_pairs(func, phis[0]), vec![(z1, left), (z2, right)]);
    assert_eq!(
        enumerate_users(func, Some(func.inst_result(phis[0]))),
        vec![out_inst]
    );
    verify_function(func).unwrap();
}

#[test]
fn test_parallel_edges_from_split_block_are_all_rewritten() {
    init_logging();
    let mut func = Function::new("f", &[Type::I32]);
    let entry = func.create_block("entry");
    let exit = func.create_block("exit");
    let p = func.param(0);

    let mut b = FunctionBuilder::new(&mut func);
    b.set_insert_point_at_end(entry);
    let pivot = b.call("yield_now", &[], Type::Void, "");
    let zero = b.iconst(Type::I32, 0);
    let z = b.binary(BinaryOp::Add, p, p, "z");
    let c = b.compare(CmpCond::Eq, z, zero, "c");
    b.branch(c, exit, exit);
    b.set_insert_point_at_end(exit);
    let m = b.phi(Type::I32, Some("m"));
    b.ret(Some(z));
    b.func_mut().add_phi_incoming(m, z, entry);
    b.func_mut().add_phi_incoming(m, z, entry);

    let cont = split_basic_block(&mut b, entry, Some(pivot), entry, "entry.cont");
    b.jump(cont);

    let func = b.func();
    let phi = first_phi(func, exit);
    assert_eq!(phi_pairs(func, phi), vec![(z, cont), (z, cont)]);
    verify_function(func).unwrap();
}

#[test]
fn test_loop_phi_in_split_block() {
    init_logging();
    let mut func = Function::new("count", &[Type::I32]);
    let entry = func.create_block("entry");
    let body = func.create_block("body");
    let exit = func.create_block("exit");
    let n = func.param(0);

    let mut b = FunctionBuilder::new(&mut func);
    b.set_insert_point_at_end(entry);
    let zero = b.iconst(Type::I32, 0);
    let one = b.iconst(Type::I32, 1);
    b.jump(body);
    b.set_insert_point_at_end(body);
    let i = b.phi(Type::I32, Some("i"));
    let next = b.binary(BinaryOp::Add, b.func().inst_result(i), one, "next");
    let done = b.compare(CmpCond::Sge, next, n, "done");
    b.branch(done, exit, body);
    b.set_insert_point_at_end(exit);
    b.ret(Some(next));
    b.func_mut().add_phi_incoming(i, zero, entry);
    b.func_mut().add_phi_incoming(i, next, body);

    let latch = split_basic_block(&mut b, body, Some(i), body, "body.latch");
    b.jump(latch);

    let func = b.func();
    assert!(!func.is_inst_live(i));
    let phi = first_phi(func, body);
    assert_eq!(func.block_insts(body).len(), 2);
    assert_eq!(phi_pairs(func, phi), vec![(zero, entry), (next, latch)]);
    // `next` now reads the replacement phi.
    assert_eq!(
        func.inst_kind(inst_of(func, next)).operands(),
        vec![func.inst_result(phi), one]
    );
    verify_function(func).unwrap();
}

#[test]
fn test_self_referencing_phi_points_at_its_replacement() {
    init_logging();
    let mut func = Function::new("spin", &[Type::I1]);
    let entry = func.create_block("entry");
    let header = func.create_block("header");
    let exit = func.create_block("exit");
    let cond = func.param(0);

    let mut b = FunctionBuilder::new(&mut func);
    b.set_insert_point_at_end(entry);
    let seed = b.binary(BinaryOp::Or, cond, cond, "seed");
    b.jump(header);
    b.set_insert_point_at_end(header);
    let acc = b.phi(Type::I1, Some("acc"));
    let step = b.binary(BinaryOp::And, b.func().inst_result(acc), cond, "step");
    b.branch(step, header, exit);
    b.set_insert_point_at_end(exit);
    b.ret(None);
    let acc_value = b.func().inst_result(acc);
    b.func_mut().add_phi_incoming(acc, seed, entry);
    b.func_mut().add_phi_incoming(acc, step, header);
    // The header phi also observes its own value on a second path.
    b.func_mut().add_phi_incoming(acc, acc_value, header);

    let cont = split_basic_block(&mut b, header, Some(acc), header, "header.cont");
    b.jump(cont);

    let func = b.func();
    let phi = first_phi(func, header);
    let phi_value = func.inst_result(phi);
    assert_eq!(
        phi_pairs(func, phi),
        vec![(seed, entry), (step, cont), (phi_value, header)]
    );
    assert!(func.value_uses(acc_value).is_empty());
    verify_function_with_options(func, &VerifierOptions::structural()).unwrap();
}

#[test]
fn test_phi_reading_a_moved_phi_follows_its_replacement() {
    init_logging();
    let mut func = Function::new("relay", &[Type::I1]);
    let entry = func.create_block("entry");
    let header = func.create_block("header");
    let exit = func.create_block("exit");
    let cond = func.param(0);

    let mut b = FunctionBuilder::new(&mut func);
    b.set_insert_point_at_end(entry);
    let seed = b.binary(BinaryOp::Or, cond, cond, "seed");
    b.jump(header);
    b.set_insert_point_at_end(header);
    let p1 = b.phi(Type::I1, Some("p1"));
    b.branch(cond, header, exit);
    b.set_insert_point_at_end(exit);
    let p2 = b.phi(Type::I1, Some("p2"));
    b.ret(None);
    let p1_value = b.func().inst_result(p1);
    let f = b.func_mut();
    f.add_phi_incoming(p1, seed, entry);
    f.add_phi_incoming(p1, p1_value, header);
    f.add_phi_incoming(p2, p1_value, header);

    // Moving the whole header moves `p1` itself; `p2` is repaired after it.
    let cont = split_basic_block(&mut b, header, None, header, "header.cont");
    b.jump(cont);

    let func = b.func();
    assert!(!func.is_inst_live(p1));
    assert!(!func.is_inst_live(p2));
    let new_p1 = first_phi(func, cont);
    let new_p1_value = func.inst_result(new_p1);
    assert_eq!(func.value_name(new_p1_value), Some("p1"));
    assert_eq!(
        phi_pairs(func, new_p1),
        vec![(seed, entry), (new_p1_value, cont)]
    );

    let new_p2 = first_phi(func, exit);
    assert_eq!(phi_pairs(func, new_p2), vec![(new_p1_value, cont)]);
    assert_eq!(func.value_block(new_p1_value), Some(cont));
    verify_function_with_options(func, &VerifierOptions::structural()).unwrap();
}

#[test]
fn test_split_after_last_instruction_leaves_phis_alone() {
    init_logging();
    let mut func = Function::new("f", &[Type::I32]);
    let entry = func.create_block("entry");
    let exit = func.create_block("exit");
    let p = func.param(0);

    let mut b = FunctionBuilder::new(&mut func);
    b.set_insert_point_at_end(entry);
    let x = b.binary(BinaryOp::Add, p, p, "x");
    let jump = b.jump(exit);
    b.set_insert_point_at_end(exit);
    let m = b.phi(Type::I32, Some("m"));
    b.ret(Some(b.func().inst_result(m)));
    b.func_mut().add_phi_incoming(m, x, entry);

    let before = b.func().block_insts(entry);
    let empty = split_basic_block(&mut b, entry, Some(jump), exit, "after.exit");

    let func = b.func();
    assert!(func.block(empty).is_empty());
    assert_eq!(func.block_insts(entry), before);
    assert_eq!(func.layout(), &[entry, exit, empty]);
    assert!(func.is_inst_live(m));
    assert_eq!(phi_pairs(func, m), vec![(x, entry)]);
}

#[test]
fn test_split_before_first_instruction_moves_everything() {
    init_logging();
    let mut func = Function::new("f", &[Type::I32]);
    let pre = func.create_block("pre");
    let entry = func.create_block("entry");
    let exit = func.create_block("exit");
    let p = func.param(0);

    let mut b = FunctionBuilder::new(&mut func);
    b.set_insert_point_at_end(pre);
    b.jump(entry);
    b.set_insert_point_at_end(entry);
    let x = b.binary(BinaryOp::Add, p, p, "x");
    b.jump(exit);
    b.set_insert_point_at_end(exit);
    let m = b.phi(Type::I32, Some("m"));
    b.ret(Some(b.func().inst_result(m)));
    b.func_mut().add_phi_incoming(m, x, entry);

    let moved = b.func().block_insts(entry);
    let body = split_basic_block(&mut b, entry, None, entry, "entry.body");
    b.jump(body);

    let func = b.func();
    assert_eq!(func.block_insts(body), moved);
    assert_eq!(func.block_insts(entry).len(), 1);
    assert_eq!(phi_pairs(func, first_phi(func, exit)), vec![(x, body)]);
    verify_function(func).unwrap();
}

#[test]
fn test_split_result_survives_json_dump() {
    init_logging();
    let mut func = Function::new("f", &[Type::I32]);
    let entry = func.create_block("entry");
    let p = func.param(0);

    let mut b = FunctionBuilder::new(&mut func);
    b.set_insert_point_at_end(entry);
    let head = b.call("block_on", &[p], Type::Void, "");
    b.ret(Some(p));
    let cont = split_basic_block(&mut b, entry, Some(head), entry, "entry.cont");
    b.jump(cont);

    let json = func.to_json().unwrap();
    let reloaded = Function::from_json(&json).unwrap();
    assert_eq!(reloaded.to_string(), func.to_string());
    verify_function(&reloaded).unwrap();
}

#[test]
#[should_panic(expected = "does not belong to")]
fn test_split_point_from_another_block_panics() {
    let mut func = Function::new("f", &[Type::I32]);
    let entry = func.create_block("entry");
    let other = func.create_block("other");
    let p = func.param(0);

    let mut b = FunctionBuilder::new(&mut func);
    b.set_insert_point_at_end(entry);
    let x = b.binary(BinaryOp::Add, p, p, "x");
    let x_inst = inst_of(b.func(), x);
    split_basic_block(&mut b, other, Some(x_inst), other, "bad");
}
