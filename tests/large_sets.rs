//! Containers over a set of 220 members, built with the default
//! `recursion_limit`.

use vari::{
    handlers::{Handle, Poly},
    prelude::*,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Tag<const N: usize>;

macro_rules! tags {
    ($($n:literal)*) => { types![$(Tag<$n>),*] };
}

type Big = tags![
    0 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15 16 17 18 19
    20 21 22 23 24 25 26 27 28 29 30 31 32 33 34 35 36 37 38 39
    40 41 42 43 44 45 46 47 48 49 50 51 52 53 54 55 56 57 58 59
    60 61 62 63 64 65 66 67 68 69 70 71 72 73 74 75 76 77 78 79
    80 81 82 83 84 85 86 87 88 89 90 91 92 93 94 95 96 97 98 99
    100 101 102 103 104 105 106 107 108 109 110 111 112 113 114 115 116 117 118 119
    120 121 122 123 124 125 126 127 128 129 130 131 132 133 134 135 136 137 138 139
    140 141 142 143 144 145 146 147 148 149 150 151 152 153 154 155 156 157 158 159
    160 161 162 163 164 165 166 167 168 169 170 171 172 173 174 175 176 177 178 179
    180 181 182 183 184 185 186 187 188 189 190 191 192 193 194 195 196 197 198 199
    200 201 202 203 204 205 206 207 208 209 210 211 212 213 214 215 216 217 218 219
];

#[derive(Clone, Copy)]
struct Read;

impl<'a, const N: usize> Handle<&'a Tag<N>> for Read {
    type Output = usize;

    fn handle(self, _: &'a Tag<N>) -> usize {
        N
    }
}

impl Handle<Empty> for Read {
    type Output = usize;

    fn handle(self, _: Empty) -> usize {
        usize::MAX
    }
}

#[test]
fn test_value_visits_last_member() {
    let value = VVal::<Big>::new(Tag::<219>);
    assert_eq!(value.index(), 219);
    assert_eq!(value.visit(Poly(Read)), 219);
}

#[test]
fn test_value_visits_across_branches() {
    assert_eq!(VVal::<Big>::new(Tag::<0>).visit(Poly(Read)), 0);
    assert_eq!(VVal::<Big>::new(Tag::<63>).visit(Poly(Read)), 63);
    assert_eq!(VVal::<Big>::new(Tag::<64>).visit(Poly(Read)), 64);
    assert_eq!(VVal::<Big>::new(Tag::<128>).visit(Poly(Read)), 128);
    assert_eq!(VVal::<Big>::new(Tag::<200>).visit(Poly(Read)), 200);
}

#[test]
fn test_value_clone_and_eq() {
    let value = VVal::<Big>::new(Tag::<150>);
    let copy = value.clone();
    assert_eq!(copy.index(), 150);
    assert!(copy == value);
    assert!(copy != VVal::<Big>::new(Tag::<151>));
}

#[test]
fn test_optional_and_heap_forms() {
    let empty = VOpt::<Big>::empty();
    assert_eq!(empty.index(), None);
    assert_eq!(empty.visit(Poly(Read)), usize::MAX);

    let held = VOpt::<Big>::new(Tag::<97>);
    assert_eq!(held.index(), Some(97));
    assert_eq!(held.visit(Poly(Read)), 97);

    let boxed = UvPtr::<Big>::new(Tag::<219>);
    assert_eq!(boxed.index(), Some(219));
    assert_eq!(boxed.visit(Poly(Read)), 219);
}
